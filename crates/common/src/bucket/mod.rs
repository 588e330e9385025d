//! Bucket data structures and operations
//!
//! A bucket is nothing more than a directory under the storage root. This module
//! defines the types that describe buckets and the components that operate on them:
//!
//! - **[`PathResolver`]**: turns a client-supplied bucket label and filename into a safe,
//!   normalized relative path (no I/O)
//! - **[`BucketStore`]**: directory lifecycle under the root, plus the canonical
//!   root-containment check every filesystem operation goes through
//! - **[`Enumerator`]**: walks the store and snapshots every bucket with its files
//! - **[`Uploader`]**: places uploaded bytes into a bucket, replacing any previous file
//! - **[`Downloader`]**: opens a stored file, sniffs its content type and hands back a
//!   handle positioned at the first byte
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   |-- photos/            bucket "photos"
//!   |     |-- a.png
//!   |     `-- 2024/        bucket "photos/2024"
//!   |           `-- b.png
//!   `-- logs/              bucket "logs"
//!         `-- today.txt
//! ```
//!
//! The filesystem is the only durable state. [`Bucket`] and [`BucketFile`] values are
//! snapshots built per request and discarded afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod download;
mod enumerate;
mod path;
pub mod sniff;
mod store;
mod upload;

pub use download::{Download, Downloader, SNIFF_LEN};
pub use enumerate::Enumerator;
pub use path::{PathResolver, ResolvedPath, BUCKET_DELIMITER};
pub use store::BucketStore;
pub use upload::{Ownership, UploadReceipt, Uploader};

/// A directory under the storage root together with the files directly inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Path relative to the root, segments joined with [`BUCKET_DELIMITER`]
    pub name: String,
    pub files: Vec<BucketFile>,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
        }
    }
}

/// Filesystem metadata for a single file, as observed at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketFile {
    pub name: String,
    pub size: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("path escapes the storage root: {0}")]
    OutsideRoot(PathBuf),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to change ownership of {path}: {source}")]
    Ownership {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BucketError {
    /// Errors caused by what the client asked for, as opposed to the state of the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BucketError::InvalidPath(_) | BucketError::OutsideRoot(_) | BucketError::NotFound(_)
        )
    }
}
