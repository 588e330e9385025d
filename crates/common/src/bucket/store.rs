use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs;

use super::BucketError;

/// Mode for bucket directories: owner rwx, group and other r-x.
#[cfg(unix)]
const BUCKET_DIR_MODE: u32 = 0o755;

/// Filesystem-backed bucket hierarchy under a fixed root.
///
/// The root is created and canonicalized once in [`BucketStore::open`]; every path
/// handed out afterwards has passed [`BucketStore::contain`].
#[derive(Debug, Clone)]
pub struct BucketStore {
    root: PathBuf,
}

impl BucketStore {
    /// Open (creating if needed) the storage root.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, BucketError> {
        let root = root.as_ref();
        if !fs::try_exists(root).await? {
            tracing::info!(root = %root.display(), "creating storage root");
            create_dirs(root).await?;
        }
        let root = fs::canonicalize(root).await?;
        if !fs::metadata(&root).await?.is_dir() {
            return Err(BucketError::InvalidPath(format!(
                "storage root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the bucket directory and any missing parents. Calling this for a
    /// bucket that already exists is a no-op.
    ///
    /// A regular file sitting anywhere along the bucket path is an `InvalidPath`.
    pub async fn ensure_bucket(&self, bucket: &Path) -> Result<PathBuf, BucketError> {
        let dir = match self.contain(bucket).await {
            // canonicalize fails with ENOTDIR when a file is used as a directory
            Err(BucketError::Io(e)) => match self.file_in_the_way(bucket).await? {
                Some(file) => return Err(not_a_bucket(&file)),
                None => return Err(BucketError::Io(e)),
            },
            contained => contained?,
        };
        if let Some(file) = self.file_in_the_way(bucket).await? {
            return Err(not_a_bucket(&file));
        }
        if !self.exists(bucket).await? {
            tracing::info!(bucket = %bucket.display(), "creating bucket directory");
            create_dirs(&dir).await?;
        }
        Ok(dir)
    }

    /// Whether the bucket directory exists. Only "not found" maps to `false`;
    /// permission and other I/O failures are returned as errors.
    pub async fn exists(&self, bucket: &Path) -> Result<bool, BucketError> {
        let dir = self.contain(bucket).await?;
        match fs::metadata(&dir).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// The shortest prefix of `bucket` that exists as something other than a
    /// directory.
    async fn file_in_the_way(&self, bucket: &Path) -> Result<Option<PathBuf>, BucketError> {
        let mut prefix = PathBuf::new();
        for segment in bucket.components() {
            prefix.push(segment);
            match fs::metadata(self.root.join(&prefix)).await {
                Ok(meta) if meta.is_dir() => continue,
                Ok(_) => return Ok(Some(prefix)),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    /// Join a relative path onto the root and verify the result cannot leave it.
    ///
    /// The path must consist of plain segments only. The deepest part of it that
    /// already exists is canonicalized (resolving symlinks) and must still sit under
    /// the root. A dangling symlink anywhere along the path is rejected, since writing
    /// through it would create a file wherever it points.
    pub async fn contain(&self, relative: &Path) -> Result<PathBuf, BucketError> {
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(BucketError::OutsideRoot(relative.to_path_buf()));
        }

        let candidate = self.root.join(relative);
        let mut probe = candidate.as_path();
        loop {
            match fs::canonicalize(probe).await {
                Ok(real) if real.starts_with(&self.root) => return Ok(candidate),
                Ok(_) => return Err(BucketError::OutsideRoot(relative.to_path_buf())),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    if fs::symlink_metadata(probe).await.is_ok() {
                        return Err(BucketError::OutsideRoot(relative.to_path_buf()));
                    }
                    probe = match probe.parent() {
                        Some(parent) => parent,
                        None => return Err(BucketError::OutsideRoot(relative.to_path_buf())),
                    };
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn not_a_bucket(file: &Path) -> BucketError {
    BucketError::InvalidPath(format!("{} is a file, not a bucket", file.display()))
}

async fn create_dirs(path: &Path) -> Result<(), BucketError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(BUCKET_DIR_MODE);
    builder.create(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        let store = BucketStore::open(&root).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), std::fs::canonicalize(&root).unwrap());
    }

    #[tokio::test]
    async fn test_open_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        std::fs::write(&root, b"not a dir").unwrap();
        assert!(matches!(
            BucketStore::open(&root).await,
            Err(BucketError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_bucket_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        let bucket = Path::new("photos").join("2024");

        assert!(!store.exists(&bucket).await.unwrap());
        let dir = store.ensure_bucket(&bucket).await.unwrap();
        assert!(dir.is_dir());
        assert!(store.exists(&bucket).await.unwrap());

        let again = store.ensure_bucket(&bucket).await.unwrap();
        assert_eq!(dir, again);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bucket_dir_mode_allows_owner() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        let dir = store.ensure_bucket(Path::new("logs")).await.unwrap();
        let mode = std::fs::metadata(dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o700, 0o700);
    }

    #[tokio::test]
    async fn test_exists_is_false_for_file() {
        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        std::fs::write(store.root().join("plain"), b"x").unwrap();
        assert!(!store.exists(Path::new("plain")).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_bucket_over_file() {
        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        store.ensure_bucket(Path::new("a")).await.unwrap();
        std::fs::write(store.root().join("a").join("plain"), b"x").unwrap();

        for bucket in ["a/plain", "a/plain/deeper"] {
            let err = store.ensure_bucket(Path::new(bucket)).await.unwrap_err();
            assert!(matches!(err, BucketError::InvalidPath(_)), "{}: {:?}", bucket, err);
            assert!(err.is_client_error());
        }
        assert!(store.root().join("a").join("plain").is_file());
    }

    #[tokio::test]
    async fn test_contain_rejects_non_normal_components() {
        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();

        for path in ["../escape", "a/../../escape", "/etc/passwd"] {
            assert!(matches!(
                store.contain(Path::new(path)).await,
                Err(BucketError::OutsideRoot(_))
            ));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_contain_rejects_symlink_escape() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path().join("data")).await.unwrap();

        std::os::unix::fs::symlink(outside.path(), store.root().join("link")).unwrap();
        assert!(matches!(
            store.contain(&Path::new("link").join("file.txt")).await,
            Err(BucketError::OutsideRoot(_))
        ));

        std::os::unix::fs::symlink(
            outside.path().join("missing"),
            store.root().join("dangling"),
        )
        .unwrap();
        assert!(matches!(
            store.contain(Path::new("dangling")).await,
            Err(BucketError::OutsideRoot(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_contain_allows_symlink_inside_root() {
        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        store.ensure_bucket(Path::new("real")).await.unwrap();
        std::os::unix::fs::symlink(store.root().join("real"), store.root().join("alias")).unwrap();

        let path = store.contain(&Path::new("alias").join("a.txt")).await.unwrap();
        assert_eq!(path, store.root().join("alias").join("a.txt"));
    }
}
