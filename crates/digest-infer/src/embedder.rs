//! Embedding backend trait and the no-op fallback.
//!
//! The semantic matcher only talks to `EmbedderBackend`. When no model is
//! loaded, `NoopEmbedder` reports itself unavailable and the matcher skips
//! the semantic layer.

use ndarray::Array1;

/// One embedded text.
#[derive(Debug, Clone)]
pub struct Embedding {
    /// Float32 vector (384-dim for all-MiniLM-L6-v2).
    pub vector: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Embed a single text. Returns None when the text could not be embedded.
    fn embed(&self, text: &str) -> Option<Embedding>;

    /// Embed a batch, one slot per input in input order.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Whether a model is loaded and `embed` can succeed.
    fn is_available(&self) -> bool;

    /// Short label for logs and API responses.
    fn name(&self) -> &str;
}

/// Embedder used when no model could be loaded (keyword-only mode).
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Option<Embedding> {
        None
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "none"
    }
}
