use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use walkdir::{DirEntry, WalkDir};

use super::{Bucket, BucketError, BucketFile, BucketStore, BUCKET_DELIMITER};

/// Snapshots the bucket hierarchy under a storage root.
///
/// The walk is depth-first pre-order. Within a directory, files are visited before
/// subdirectories and each group is ordered by name, so every file is attributed to
/// the bucket of the directory that contains it and the output is stable across
/// platforms. The root itself is never reported as a bucket, which means files
/// stored directly in the root are not listed.
#[derive(Debug, Clone)]
pub struct Enumerator {
    root: PathBuf,
}

impl Enumerator {
    pub fn new(store: &BucketStore) -> Self {
        Self {
            root: store.root().to_path_buf(),
        }
    }

    /// Walk the root and return every bucket whose name contains `filter`.
    ///
    /// Any I/O error aborts the walk; partial results are dropped.
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<Bucket>, BucketError> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by(files_first);

        let acc = walker
            .into_iter()
            .try_fold(Accumulator::new(filter), |acc, entry| {
                acc.visit(&self.root, entry?)
            })?;

        Ok(acc.finish())
    }

    /// [`Enumerator::list`] on the blocking thread pool.
    pub async fn list_blocking(&self, filter: Option<String>) -> Result<Vec<Bucket>, BucketError> {
        let enumerator = self.clone();
        tokio::task::spawn_blocking(move || enumerator.list(filter.as_deref()))
            .await
            .map_err(|e| BucketError::Io(std::io::Error::other(e)))?
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn bucket_name(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(&BUCKET_DELIMITER.to_string())
}

/// Buckets completed so far plus the one files are currently attributed to.
struct Accumulator<'f> {
    filter: Option<&'f str>,
    done: Vec<Bucket>,
    open: Option<OpenBucket>,
}

struct OpenBucket {
    bucket: Bucket,
    included: bool,
}

impl<'f> Accumulator<'f> {
    fn new(filter: Option<&'f str>) -> Self {
        Self {
            filter,
            done: Vec::new(),
            open: None,
        }
    }

    fn visit(mut self, root: &Path, entry: DirEntry) -> Result<Self, BucketError> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            self.close();
            let name = bucket_name(root, entry.path());
            let included = self.filter.map_or(true, |f| name.contains(f));
            self.open = Some(OpenBucket {
                bucket: Bucket::new(name),
                included,
            });
        } else if file_type.is_file() {
            let Some(open) = self.open.as_mut() else {
                tracing::debug!(path = %entry.path().display(), "skipping file in storage root");
                return Ok(self);
            };
            let meta = entry.metadata()?;
            open.bucket.files.push(BucketFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                modified_at: OffsetDateTime::from(meta.modified()?),
            });
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular entry");
        }

        Ok(self)
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            if open.included {
                self.done.push(open.bucket);
            }
        }
    }

    fn finish(mut self) -> Vec<Bucket> {
        self.close();
        self.done
    }
}
