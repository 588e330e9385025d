use std::io::SeekFrom;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::sniff;
use super::{BucketError, BucketStore, PathResolver};

pub use super::sniff::SNIFF_LEN;

/// An opened stored file, positioned at offset 0 and ready to stream.
#[derive(Debug)]
pub struct Download {
    pub file: File,
    /// Leaf filename, for `Content-Disposition`.
    pub name: String,
    pub content_type: &'static str,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct Downloader {
    store: BucketStore,
}

impl Downloader {
    pub fn new(store: BucketStore) -> Self {
        Self { store }
    }

    /// Locate `file` (a path relative to the storage root) and prepare it for
    /// streaming.
    ///
    /// Failing to open the path, or finding something other than a regular file
    /// there, is reported as [`BucketError::NotFound`]. Errors once the file is open
    /// are plain I/O errors.
    pub async fn open(&self, file: &str) -> Result<Download, BucketError> {
        if file.is_empty() {
            return Err(BucketError::InvalidPath("file parameter is required".to_string()));
        }
        let resolved = PathResolver::resolve(None, file)?;
        let path = match self.store.contain(&resolved.file_path()).await {
            Ok(path) => path,
            // e.g. a regular file where a bucket directory was expected
            Err(BucketError::Io(e)) => {
                tracing::debug!(file = %resolved, "lookup failed: {}", e);
                return Err(BucketError::NotFound(resolved.to_string()));
            }
            Err(e) => return Err(e),
        };

        let mut handle = match File::open(&path).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::debug!(file = %resolved, "open failed: {}", e);
                return Err(BucketError::NotFound(resolved.to_string()));
            }
        };
        let meta = handle.metadata().await?;
        if !meta.is_file() {
            return Err(BucketError::NotFound(resolved.to_string()));
        }

        let mut head = vec![0u8; SNIFF_LEN];
        let mut filled = 0;
        while filled < SNIFF_LEN {
            let n = handle.read(&mut head[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        let content_type = sniff::sniff(&head[..filled]);
        handle.seek(SeekFrom::Start(0)).await?;

        tracing::debug!(
            file = %resolved,
            content_type,
            size = meta.len(),
            "serving file"
        );

        Ok(Download {
            file: handle,
            name: resolved.leaf().to_string(),
            content_type,
            size: meta.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Uploader;
    use tempfile::TempDir;

    async fn setup() -> (Downloader, Uploader, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        (
            Downloader::new(store.clone()),
            Uploader::new(store),
            temp,
        )
    }

    async fn body(download: Download) -> Vec<u8> {
        let mut file = download.file;
        let mut out = Vec::new();
        file.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_open_sniffs_and_rewinds() {
        let (downloader, uploader, _temp) = setup().await;
        uploader
            .upload(Some("photos"), "a.png", b"\x89PNG\x0D\x0A\x1A\x0Arest")
            .await
            .unwrap();

        let download = downloader.open("photos/a.png").await.unwrap();
        assert_eq!(download.name, "a.png");
        assert_eq!(download.content_type, "image/png");
        assert_eq!(download.size, 12);
        assert_eq!(body(download).await, b"\x89PNG\x0D\x0A\x1A\x0Arest");
    }

    #[tokio::test]
    async fn test_open_large_file_streams_everything() {
        let (downloader, uploader, _temp) = setup().await;
        let data: Vec<u8> = (0..4 * SNIFF_LEN).map(|i| b'a' + (i % 26) as u8).collect();
        uploader.upload(Some("big"), "alpha.txt", &data).await.unwrap();

        let download = downloader.open("big/alpha.txt").await.unwrap();
        assert_eq!(download.content_type, "text/plain; charset=utf-8");
        assert_eq!(download.size, data.len() as u64);
        assert_eq!(body(download).await, data);
    }

    #[tokio::test]
    async fn test_open_empty_file() {
        let (downloader, uploader, _temp) = setup().await;
        uploader.upload(Some("e"), "empty", b"").await.unwrap();

        let download = downloader.open("e/empty").await.unwrap();
        assert_eq!(download.size, 0);
        assert_eq!(download.content_type, "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn test_open_missing_param() {
        let (downloader, _uploader, _temp) = setup().await;
        assert!(matches!(
            downloader.open("").await,
            Err(BucketError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_open_missing_file_and_directory() {
        let (downloader, uploader, _temp) = setup().await;
        uploader.upload(Some("photos"), "a.png", b"x").await.unwrap();

        assert!(matches!(
            downloader.open("photos/nope.png").await,
            Err(BucketError::NotFound(_))
        ));
        assert!(matches!(
            downloader.open("photos").await,
            Err(BucketError::NotFound(_))
        ));
        assert!(matches!(
            downloader.open("photos/a.png/deeper").await,
            Err(BucketError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_rejects_traversal() {
        let (downloader, _uploader, _temp) = setup().await;

        for file in ["../ferry-secret", "/etc/passwd", "a/../../x"] {
            let err = downloader.open(file).await.unwrap_err();
            assert!(err.is_client_error());
            assert!(!matches!(err, BucketError::Io(_)));
        }
    }
}
