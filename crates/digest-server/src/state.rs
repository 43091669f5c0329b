//! Shared application state.

use std::sync::Arc;

use digest_core::{DigestConfig, TopicRegistry};
use digest_infer::EmbedderBackend;
use digest_store::SnapshotStore;
use parking_lot::RwLock;

/// State accessible from all route handlers and the pipeline runner.
pub struct AppState {
    pub config: DigestConfig,
    /// Replaced wholesale by POST /topics.
    pub registry: RwLock<TopicRegistry>,
    pub embedder: Arc<dyn EmbedderBackend>,
    pub snapshots: SnapshotStore,
}

impl AppState {
    /// Validate the configured topics and open the snapshot directory.
    pub fn new(config: DigestConfig, embedder: Arc<dyn EmbedderBackend>) -> digest_core::Result<Self> {
        let registry = TopicRegistry::new(config.topics.clone())?;
        let snapshots = SnapshotStore::open(&config.data_dir)?;
        Ok(Self {
            config,
            registry: RwLock::new(registry),
            embedder,
            snapshots,
        })
    }
}
