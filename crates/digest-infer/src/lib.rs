//! Paper Digest Infer: sentence embeddings for the semantic matching layer.
//!
//! Provides the `EmbedderBackend` trait. When the `onnx` feature is enabled
//! and model files are present, `OnnxEmbedder` loads all-MiniLM-L6-v2.
//! Without it, `NoopEmbedder` is used and matching runs keyword-only.

pub mod cache;
pub mod embedder;
pub mod onnx_embedder;

pub use cache::EmbeddingCache;
pub use embedder::{EmbedderBackend, Embedding, NoopEmbedder};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

/// Dimension reported by the fallback embedder.
pub const DEFAULT_DIMENSION: usize = 384;

/// How the semantic matching layer will behave with a given backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SemanticMode {
    /// Papers missed by the keyword layer are scored against topic descriptions.
    Embedding { model: String, dimension: usize },
    /// Only topic terms can classify a paper.
    KeywordOnly,
}

impl SemanticMode {
    pub fn of(embedder: &dyn EmbedderBackend) -> Self {
        if embedder.is_available() {
            Self::Embedding {
                model: embedder.name().to_string(),
                dimension: embedder.dimension(),
            }
        } else {
            Self::KeywordOnly
        }
    }
}

impl fmt::Display for SemanticMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedding { model, dimension } => {
                write!(f, "embedding similarity ({}, {}-dim)", model, dimension)
            }
            Self::KeywordOnly => write!(f, "keyword only"),
        }
    }
}

/// Backend for topic-description similarity.
///
/// Loads the sentence model from `model_dir` when built with `onnx`; any
/// failure leaves the matcher keyword-only rather than erroring.
pub fn create_embedder(model_dir: &Path) -> Arc<dyn EmbedderBackend> {
    let embedder =
        load_model(model_dir).unwrap_or_else(|| Arc::new(NoopEmbedder::new(DEFAULT_DIMENSION)));
    info!("Semantic layer: {}", SemanticMode::of(embedder.as_ref()));
    embedder
}

#[cfg(feature = "onnx")]
fn load_model(model_dir: &Path) -> Option<Arc<dyn EmbedderBackend>> {
    match OnnxEmbedder::load(model_dir) {
        Ok(embedder) => Some(Arc::new(embedder)),
        Err(e) => {
            tracing::warn!(
                "No sentence model in {}: {}. Topic descriptions will be ignored.",
                model_dir.display(),
                e
            );
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn load_model(model_dir: &Path) -> Option<Arc<dyn EmbedderBackend>> {
    tracing::debug!(
        "Built without the onnx feature; not looking for a model in {}",
        model_dir.display()
    );
    None
}
