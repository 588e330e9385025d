use std::path::PathBuf;

use super::BucketError;

/// Separator used when a bucket path is rendered as a name.
pub const BUCKET_DELIMITER: char = '/';

/// Output of [`PathResolver::resolve`]: where a file lives relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    segments: Vec<String>,
    leaf: String,
}

impl ResolvedPath {
    /// Bucket name, empty for the root bucket.
    pub fn bucket(&self) -> String {
        self.segments.join(&BUCKET_DELIMITER.to_string())
    }

    /// Final path segment of the file.
    pub fn leaf(&self) -> &str {
        &self.leaf
    }

    pub fn is_root_bucket(&self) -> bool {
        self.segments.is_empty()
    }

    /// Relative directory of the bucket, using the platform separator.
    pub fn bucket_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    /// Relative path of the file, using the platform separator.
    pub fn file_path(&self) -> PathBuf {
        let mut path = self.bucket_path();
        path.push(&self.leaf);
        path
    }
}

impl std::fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root_bucket() {
            write!(f, "{}", self.leaf)
        } else {
            write!(f, "{}{}{}", self.bucket(), BUCKET_DELIMITER, self.leaf)
        }
    }
}

/// Derives bucket and leaf filename from client input.
///
/// Both `/` and `\` count as separators on every platform. Empty and `.`
/// segments are dropped. `..`, NUL bytes, drive prefixes and absolute filenames are
/// rejected outright rather than cleaned up.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl PathResolver {
    /// Resolve an optional bucket label plus a filename that may itself carry bucket
    /// segments (`"2024/b.png"`).
    pub fn resolve(bucket: Option<&str>, filename: &str) -> Result<ResolvedPath, BucketError> {
        if filename.starts_with(['/', '\\']) {
            return Err(BucketError::InvalidPath(format!(
                "absolute filenames are not allowed: {}",
                filename
            )));
        }

        let mut segments = match bucket {
            Some(label) => Self::resolve_bucket(label)?,
            None => Vec::new(),
        };

        let mut file_segments = Self::segments(filename)?;
        let leaf = file_segments
            .pop()
            .ok_or_else(|| BucketError::InvalidPath(format!("missing filename: {:?}", filename)))?;
        if filename.ends_with(['/', '\\']) {
            return Err(BucketError::InvalidPath(format!(
                "filename must not end with a separator: {}",
                filename
            )));
        }
        segments.extend(file_segments);

        Ok(ResolvedPath { segments, leaf })
    }

    /// Normalize a bucket label into its path segments. Surrounding separators are
    /// ignored, so `"/photos/"` and `"photos"` name the same bucket.
    pub fn resolve_bucket(label: &str) -> Result<Vec<String>, BucketError> {
        Self::segments(label)
    }

    fn segments(input: &str) -> Result<Vec<String>, BucketError> {
        let mut segments = Vec::new();
        for segment in input.split(['/', '\\']) {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(BucketError::InvalidPath(format!(
                        "parent directory references are not allowed: {}",
                        input
                    )))
                }
                s if s.contains('\0') => {
                    return Err(BucketError::InvalidPath(
                        "path contains a NUL byte".to_string(),
                    ))
                }
                s if is_drive_prefix(s) && segments.is_empty() => {
                    return Err(BucketError::InvalidPath(format!(
                        "drive prefixes are not allowed: {}",
                        input
                    )))
                }
                s => segments.push(s.to_string()),
            }
        }
        Ok(segments)
    }
}

fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_label_and_plain_filename() {
        let resolved = PathResolver::resolve(Some("photos"), "a.png").unwrap();
        assert_eq!(resolved.bucket(), "photos");
        assert_eq!(resolved.leaf(), "a.png");
        assert_eq!(resolved.file_path(), PathBuf::from("photos").join("a.png"));
        assert_eq!(resolved.to_string(), "photos/a.png");
    }

    #[test]
    fn test_filename_carries_nested_bucket() {
        let resolved = PathResolver::resolve(Some("photos"), "2024/summer\\b.png").unwrap();
        assert_eq!(resolved.bucket(), "photos/2024/summer");
        assert_eq!(resolved.leaf(), "b.png");
        assert_eq!(
            resolved.bucket_path(),
            ["photos", "2024", "summer"].iter().collect::<PathBuf>()
        );
    }

    #[test]
    fn test_root_bucket() {
        let resolved = PathResolver::resolve(None, "notes.txt").unwrap();
        assert!(resolved.is_root_bucket());
        assert_eq!(resolved.bucket(), "");
        assert_eq!(resolved.to_string(), "notes.txt");

        let resolved = PathResolver::resolve(Some(""), "notes.txt").unwrap();
        assert!(resolved.is_root_bucket());
    }

    #[test]
    fn test_redundant_segments_are_dropped() {
        let resolved = PathResolver::resolve(Some("/logs//./"), "./today.txt").unwrap();
        assert_eq!(resolved.bucket(), "logs");
        assert_eq!(resolved.leaf(), "today.txt");
    }

    #[test]
    fn test_rejects_traversal() {
        for (bucket, filename) in [
            (Some(".."), "a.txt"),
            (Some("photos/../.."), "a.txt"),
            (None, "../a.txt"),
            (None, "photos/../../etc/passwd"),
            (Some("photos"), "..\\..\\secret"),
            (Some("photos"), ".."),
        ] {
            let err = PathResolver::resolve(bucket, filename).unwrap_err();
            assert!(
                matches!(err, BucketError::InvalidPath(_)),
                "expected rejection for {:?} {:?}",
                bucket,
                filename
            );
        }
    }

    #[test]
    fn test_rejects_absolute_and_drive_paths() {
        assert!(PathResolver::resolve(None, "/etc/passwd").is_err());
        assert!(PathResolver::resolve(None, "\\windows\\system.ini").is_err());
        assert!(PathResolver::resolve(None, "C:\\boot.ini").is_err());
        assert!(PathResolver::resolve(Some("c:"), "boot.ini").is_err());
    }

    #[test]
    fn test_rejects_missing_leaf() {
        assert!(PathResolver::resolve(Some("photos"), "").is_err());
        assert!(PathResolver::resolve(Some("photos"), ".").is_err());
        assert!(PathResolver::resolve(Some("photos"), "2024/").is_err());
    }

    #[test]
    fn test_rejects_nul() {
        assert!(PathResolver::resolve(Some("pho\0tos"), "a.txt").is_err());
        assert!(PathResolver::resolve(None, "a\0.txt").is_err());
    }

    #[test]
    fn test_colon_allowed_after_first_segment() {
        let resolved = PathResolver::resolve(Some("logs"), "12:30/today.txt").unwrap();
        assert_eq!(resolved.bucket(), "logs/12:30");
    }
}
