use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use super::{BucketError, BucketStore, PathResolver};

/// Mode for newly created files: owner read/write only.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Post-write ownership change for uploaded files.
///
/// With `strict` unset a failed `chown` is logged and the upload still succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    #[serde(default)]
    pub uid: Option<u32>,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub strict: bool,
}

impl Ownership {
    pub fn apply(&self, path: &Path) -> Result<(), BucketError> {
        match self.chown(path) {
            Ok(()) => Ok(()),
            Err(source) if self.strict => Err(BucketError::Ownership {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    uid = ?self.uid,
                    gid = ?self.gid,
                    "failed to change ownership of uploaded file: {}",
                    e
                );
                Ok(())
            }
        }
    }

    #[cfg(unix)]
    fn chown(&self, path: &Path) -> std::io::Result<()> {
        std::os::unix::fs::chown(path, self.uid, self.gid)
    }

    #[cfg(not(unix))]
    fn chown(&self, path: &Path) -> std::io::Result<()> {
        tracing::debug!(path = %path.display(), "ownership change not supported on this platform");
        Ok(())
    }
}

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

/// Places uploaded bytes into buckets. Writes replace any existing file of the
/// same name; concurrent writers to one file race and the last one wins.
#[derive(Debug, Clone)]
pub struct Uploader {
    store: BucketStore,
    ownership: Option<Ownership>,
}

impl Uploader {
    pub fn new(store: BucketStore) -> Self {
        Self {
            store,
            ownership: None,
        }
    }

    pub fn with_ownership(mut self, ownership: Option<Ownership>) -> Self {
        self.ownership = ownership;
        self
    }

    /// Read `reader` to the end, then [`Uploader::upload`] the bytes.
    ///
    /// The whole payload is held in memory.
    pub async fn upload_reader<R>(
        &self,
        bucket: Option<&str>,
        filename: &str,
        mut reader: R,
    ) -> Result<UploadReceipt, BucketError>
    where
        R: AsyncRead + Unpin,
    {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        self.upload(bucket, filename, &data).await
    }

    /// Write `data` as `filename` into `bucket`, creating the bucket directory if
    /// needed. A failure after the directory was created leaves it in place.
    pub async fn upload(
        &self,
        bucket: Option<&str>,
        filename: &str,
        data: &[u8],
    ) -> Result<UploadReceipt, BucketError> {
        let resolved = PathResolver::resolve(bucket, filename)?;

        self.store.ensure_bucket(&resolved.bucket_path()).await?;
        let path = self.store.contain(&resolved.file_path()).await?;

        if let Ok(meta) = tokio::fs::metadata(&path).await {
            if meta.is_dir() {
                return Err(BucketError::InvalidPath(format!(
                    "a bucket already exists at {}",
                    resolved
                )));
            }
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(FILE_MODE);

        let mut file = options.open(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        drop(file);

        if let Some(ownership) = &self.ownership {
            ownership.apply(&path)?;
        }

        tracing::info!(
            bucket = %resolved.bucket(),
            name = %resolved.leaf(),
            size = data.len(),
            "file written"
        );

        Ok(UploadReceipt {
            bucket: resolved.bucket(),
            name: resolved.leaf().to_string(),
            size: data.len() as u64,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (Uploader, BucketStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        (Uploader::new(store.clone()), store, temp)
    }

    #[tokio::test]
    async fn test_upload_creates_bucket() {
        let (uploader, store, _temp) = setup().await;

        let receipt = uploader
            .upload(Some("photos"), "a.png", b"png bytes")
            .await
            .unwrap();

        assert_eq!(receipt.bucket, "photos");
        assert_eq!(receipt.name, "a.png");
        assert_eq!(receipt.size, 9);
        assert_eq!(receipt.path, store.root().join("photos").join("a.png"));
        assert_eq!(std::fs::read(&receipt.path).unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn test_upload_replaces_existing_file() {
        let (uploader, _store, _temp) = setup().await;

        uploader
            .upload(Some("b"), "f.txt", b"first payload")
            .await
            .unwrap();
        let receipt = uploader.upload(Some("b"), "f.txt", b"2nd").await.unwrap();

        assert_eq!(std::fs::read(&receipt.path).unwrap(), b"2nd");
    }

    #[tokio::test]
    async fn test_upload_nested_filename() {
        let (uploader, store, _temp) = setup().await;

        let receipt = uploader
            .upload(Some("photos"), "2024/b.png", b"b")
            .await
            .unwrap();

        assert_eq!(receipt.bucket, "photos/2024");
        assert!(store.root().join("photos").join("2024").join("b.png").is_file());
    }

    #[tokio::test]
    async fn test_upload_reader() {
        let (uploader, _store, _temp) = setup().await;

        let receipt = uploader
            .upload_reader(None, "logs/today.txt", &b"line one\nline two\n"[..])
            .await
            .unwrap();

        assert_eq!(receipt.bucket, "logs");
        assert_eq!(receipt.size, 18);
    }

    #[tokio::test]
    async fn test_upload_rejects_traversal_without_touching_disk() {
        let (uploader, store, temp) = setup().await;

        let err = uploader
            .upload(Some("photos"), "../../escape.txt", b"x")
            .await
            .unwrap_err();

        assert!(matches!(err, BucketError::InvalidPath(_)));
        assert!(!temp.path().join("escape.txt").exists());
        assert!(!store.root().join("photos").exists());
    }

    #[tokio::test]
    async fn test_upload_onto_bucket_directory() {
        let (uploader, _store, _temp) = setup().await;
        uploader.upload(Some("a/b"), "f.txt", b"x").await.unwrap();

        let err = uploader.upload(Some("a"), "b", b"y").await.unwrap_err();
        assert!(matches!(err, BucketError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_upload_into_file_as_bucket() {
        let (uploader, store, _temp) = setup().await;
        uploader.upload(Some("a"), "plain", b"x").await.unwrap();

        let err = uploader
            .upload(Some("a/plain"), "f.txt", b"y")
            .await
            .unwrap_err();
        assert!(matches!(err, BucketError::InvalidPath(_)));

        let err = uploader
            .upload(Some("a"), "plain/f.txt", b"y")
            .await
            .unwrap_err();
        assert!(err.is_client_error());

        assert_eq!(std::fs::read(store.root().join("a").join("plain")).unwrap(), b"x");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_upload_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (uploader, _store, _temp) = setup().await;
        let receipt = uploader.upload(Some("m"), "f", b"x").await.unwrap();
        let mode = std::fs::metadata(receipt.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, FILE_MODE);
    }

    #[cfg(unix)]
    #[test]
    fn test_ownership_failure_policy() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let lenient = Ownership {
            uid: Some(0),
            gid: None,
            strict: false,
        };
        assert!(lenient.apply(&missing).is_ok());

        let strict = Ownership {
            strict: true,
            ..lenient
        };
        assert!(matches!(
            strict.apply(&missing),
            Err(BucketError::Ownership { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ownership_noop_change_succeeds() {
        use std::os::unix::fs::MetadataExt;

        let temp = TempDir::new().unwrap();
        let store = BucketStore::open(temp.path()).await.unwrap();
        let uid = std::fs::metadata(store.root()).unwrap().uid();
        let uploader = Uploader::new(store).with_ownership(Some(Ownership {
            uid: Some(uid),
            gid: None,
            strict: true,
        }));

        let receipt = uploader.upload(Some("o"), "f", b"x").await.unwrap();
        assert_eq!(std::fs::metadata(receipt.path).unwrap().uid(), uid);
    }
}
