//! Content-type detection from leading bytes.
//!
//! Implements the signature table of the WHATWG MIME Sniffing Standard, checked in
//! table order. Anything without a signature is `text/plain` unless it contains
//! binary control bytes.

/// At most this many leading bytes are considered.
pub const SNIFF_LEN: usize = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_UTF8: &str = "text/plain; charset=utf-8";
const HTML_UTF8: &str = "text/html; charset=utf-8";

enum Sig {
    /// Bytes must match exactly at offset 0.
    Exact(&'static [u8], &'static str),
    /// `data & mask == pattern`, optionally after leading whitespace.
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        skip_ws: bool,
        ct: &'static str,
    },
    /// Case-insensitive tag followed by a space or `>`.
    Html(&'static [u8]),
    Mp4,
    Text,
}

const fn exact(pattern: &'static [u8], ct: &'static str) -> Sig {
    Sig::Exact(pattern, ct)
}

const fn masked(mask: &'static [u8], pattern: &'static [u8], ct: &'static str) -> Sig {
    Sig::Masked {
        mask,
        pattern,
        skip_ws: false,
        ct,
    }
}

static SIGNATURES: &[Sig] = &[
    Sig::Html(b"<!DOCTYPE HTML"),
    Sig::Html(b"<HTML"),
    Sig::Html(b"<HEAD"),
    Sig::Html(b"<SCRIPT"),
    Sig::Html(b"<IFRAME"),
    Sig::Html(b"<H1"),
    Sig::Html(b"<DIV"),
    Sig::Html(b"<FONT"),
    Sig::Html(b"<TABLE"),
    Sig::Html(b"<A"),
    Sig::Html(b"<STYLE"),
    Sig::Html(b"<TITLE"),
    Sig::Html(b"<B"),
    Sig::Html(b"<BODY"),
    Sig::Html(b"<BR"),
    Sig::Html(b"<P"),
    Sig::Html(b"<!--"),
    Sig::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"<?xml",
        skip_ws: true,
        ct: "text/xml; charset=utf-8",
    },
    exact(b"%PDF-", "application/pdf"),
    exact(b"%!PS-Adobe-", "application/postscript"),
    // byte order marks
    masked(b"\xFF\xFF", b"\xFE\xFF", "text/plain; charset=utf-16be"),
    masked(b"\xFF\xFF", b"\xFF\xFE", "text/plain; charset=utf-16le"),
    masked(b"\xFF\xFF\xFF", b"\xEF\xBB\xBF", TEXT_UTF8),
    // images
    exact(b"\x00\x00\x01\x00", "image/x-icon"),
    exact(b"\x00\x00\x02\x00", "image/x-icon"),
    exact(b"BM", "image/bmp"),
    exact(b"GIF87a", "image/gif"),
    exact(b"GIF89a", "image/gif"),
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00WEBPVP",
        "image/webp",
    ),
    exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // audio and video
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"FORM\x00\x00\x00\x00AIFF",
        "audio/aiff",
    ),
    masked(b"\xFF\xFF\xFF", b"ID3", "audio/mpeg"),
    masked(b"\xFF\xFF\xFF\xFF\xFF", b"OggS\x00", "application/ogg"),
    masked(
        b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        b"MThd\x00\x00\x00\x06",
        "audio/midi",
    ),
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00AVI ",
        "video/avi",
    ),
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00WAVE",
        "audio/wave",
    ),
    Sig::Mp4,
    exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // fonts
    exact(b"\x00\x01\x00\x00", "font/ttf"),
    exact(b"OTTO", "font/otf"),
    exact(b"ttcf", "font/collection"),
    exact(b"wOFF", "font/woff"),
    exact(b"wOF2", "font/woff2"),
    // archives
    exact(b"\x1F\x8B\x08", "application/x-gzip"),
    exact(b"PK\x03\x04", "application/zip"),
    exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    exact(b"\x00\x61\x73\x6D", "application/wasm"),
    Sig::Text,
];

/// Detect the content type of `data`. Never fails; unknown binary content is
/// `application/octet-stream`.
pub fn sniff(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data
        .iter()
        .position(|b| !is_ws(*b))
        .unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find_map(|sig| sig.matches(data, first_non_ws))
        .unwrap_or(OCTET_STREAM)
}

impl Sig {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Sig::Exact(pattern, ct) => data.starts_with(pattern).then_some(*ct),
            Sig::Masked {
                mask,
                pattern,
                skip_ws,
                ct,
            } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                if data.len() < pattern.len() {
                    return None;
                }
                data.iter()
                    .zip(mask.iter())
                    .zip(pattern.iter())
                    .all(|((d, m), p)| d & m == *p)
                    .then_some(*ct)
            }
            Sig::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                let prefix_matches = tag.iter().zip(data.iter()).all(|(t, d)| {
                    if t.is_ascii_uppercase() {
                        d.to_ascii_uppercase() == *t
                    } else {
                        d == t
                    }
                });
                let terminated = matches!(data[tag.len()], b' ' | b'>');
                (prefix_matches && terminated).then_some(HTML_UTF8)
            }
            Sig::Mp4 => is_mp4(data).then_some("video/mp4"),
            Sig::Text => (!data[first_non_ws..].iter().any(|b| is_binary(*b))).then_some(TEXT_UTF8),
        }
    }
}

fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 {
        return false;
    }
    if &data[4..8] != b"ftyp" {
        return false;
    }
    (8..box_size)
        .step_by(4)
        // bytes 12..16 hold the minor version, not a brand
        .filter(|st| *st != 12)
        .any(|st| data.get(st..st + 3) == Some(b"mp4".as_slice()))
}

fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_markup() {
        assert_eq!(sniff(b""), TEXT_UTF8);
        assert_eq!(sniff(b"hello world\n"), TEXT_UTF8);
        assert_eq!(sniff(b"  \n<!DOCTYPE html><html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<p class=x>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<?xml version=\"1.0\"?>"), "text/xml; charset=utf-8");
        assert_eq!(sniff(b"<pre"), TEXT_UTF8);
    }

    #[test]
    fn test_binary_formats() {
        assert_eq!(sniff(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff(b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00"), "image/png");
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0"), "image/jpeg");
        assert_eq!(sniff(b"GIF89a..."), "image/gif");
        assert_eq!(sniff(b"RIFF\x10\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(sniff(b"RIFF\x10\x00\x00\x00WAVEfmt "), "audio/wave");
        assert_eq!(sniff(b"PK\x03\x04\x14\x00"), "application/zip");
        assert_eq!(sniff(b"\x1F\x8B\x08\x00"), "application/x-gzip");
        assert_eq!(sniff(b"\x00asm\x01\x00\x00\x00"), "application/wasm");
        assert_eq!(sniff(b"wOF2\x00\x01"), "font/woff2");
    }

    #[test]
    fn test_byte_order_marks() {
        assert_eq!(sniff(b"\xEF\xBB\xBFhi"), TEXT_UTF8);
        assert_eq!(sniff(b"\xFE\xFF\x00h"), "text/plain; charset=utf-16be");
        assert_eq!(sniff(b"\xFF\xFEh\x00"), "text/plain; charset=utf-16le");
    }

    #[test]
    fn test_mp4() {
        let mut data = vec![0x00, 0x00, 0x00, 0x1C];
        data.extend_from_slice(b"ftypisom\x00\x00\x02\x00isomiso2mp41");
        assert_eq!(sniff(&data), "video/mp4");
    }

    #[test]
    fn test_unknown_binary() {
        assert_eq!(sniff(b"\x00\x01\x02\x03garbage"), OCTET_STREAM);
        assert_eq!(sniff(&[0x7F, 0x45, 0x4C, 0x46, 0x02, 0x01]), OCTET_STREAM);
    }

    #[test]
    fn test_only_leading_bytes_count() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(sniff(&data), TEXT_UTF8);
    }
}
