//! Shared test utilities for bucket integration tests
#![allow(dead_code)]

pub use common::prelude::*;
use tempfile::TempDir;

/// Everything needed to drive the bucket operations against a throwaway root.
pub struct TestStore {
    pub store: BucketStore,
    pub enumerator: Enumerator,
    pub uploader: Uploader,
    pub downloader: Downloader,
    pub temp: TempDir,
}

/// Set up a storage root at `<tempdir>/data`, mirroring the daemon's default layout.
pub async fn setup_store() -> TestStore {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let temp = TempDir::new().unwrap();
    let store = BucketStore::open(temp.path().join("data")).await.unwrap();

    TestStore {
        enumerator: Enumerator::new(&store),
        uploader: Uploader::new(store.clone()),
        downloader: Downloader::new(store.clone()),
        store,
        temp,
    }
}

/// Read a download to the end.
pub async fn read_all(download: Download) -> Vec<u8> {
    use tokio::io::AsyncReadExt;

    let mut file = download.file;
    let mut out = Vec::new();
    file.read_to_end(&mut out).await.unwrap();
    out
}

pub fn find<'a>(buckets: &'a [Bucket], name: &str) -> Option<&'a Bucket> {
    buckets.iter().find(|b| b.name == name)
}
