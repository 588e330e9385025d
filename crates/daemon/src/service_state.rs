use common::prelude::{BucketError, BucketStore, Downloader, Enumerator, Ownership, Uploader};
use tokio::sync::watch;

use super::service_config::Config;

/// Main service state: the storage root and the components bound to it.
///
/// Cheap to clone; handlers share no other in-memory state.
#[derive(Debug, Clone)]
pub struct State {
    store: BucketStore,
    enumerator: Enumerator,
    uploader: Uploader,
    downloader: Downloader,
    shutdown: Option<watch::Receiver<()>>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let store = BucketStore::open(&config.data_dir)
            .await
            .map_err(StateSetupError::StorageRoot)?;
        tracing::info!(root = %store.root().display(), "storage root ready");

        Ok(Self::from_store(store, config.ownership))
    }

    pub fn from_store(store: BucketStore, ownership: Option<Ownership>) -> Self {
        Self {
            enumerator: Enumerator::new(&store),
            uploader: Uploader::new(store.clone()).with_ownership(ownership),
            downloader: Downloader::new(store.clone()),
            store,
            shutdown: None,
        }
    }

    /// Watch `shutdown_rx` so readiness can report a shutdown in progress.
    pub fn with_shutdown(mut self, shutdown_rx: watch::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown_rx);
        self
    }

    /// True once the shutdown signal has gone out (or its sender is gone).
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|rx| rx.has_changed().unwrap_or(true))
    }

    pub fn store(&self) -> &BucketStore {
        &self.store
    }

    pub fn enumerator(&self) -> &Enumerator {
        &self.enumerator
    }

    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to open storage root: {0}")]
    StorageRoot(#[source] BucketError),
}
