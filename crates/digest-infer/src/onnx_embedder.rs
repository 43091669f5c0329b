//! ONNX sentence embedder for all-MiniLM-L6-v2.
//!
//! Loads a SentenceTransformers ONNX export and its HuggingFace tokenizer and
//! produces 384-dim float32 embeddings. The session requires the `onnx`
//! feature; pooling is plain ndarray code and always compiled.

use ndarray::Array1;

/// Mean-pool token embeddings laid out as `[seq_len][dim]`, weighting each
/// token by its attention mask. Returns None when the mask is all zeros.
pub fn mean_pool(data: &[f32], attention_mask: &[u32], dim: usize) -> Option<Array1<f32>> {
    let mask_sum: f32 = attention_mask.iter().map(|&m| m as f32).sum();
    if mask_sum < 1e-9 || data.len() < attention_mask.len() * dim {
        return None;
    }

    let mut pooled = Array1::<f32>::zeros(dim);
    for (i, &m) in attention_mask.iter().enumerate() {
        if m == 0 {
            continue;
        }
        let row = &data[i * dim..(i + 1) * dim];
        for (acc, &v) in pooled.iter_mut().zip(row) {
            *acc += v * m as f32;
        }
    }
    Some(pooled / mask_sum)
}

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use digest_core::{Error, Result};
    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{info, warn};

    use super::mean_pool;
    use crate::cache::EmbeddingCache;
    use crate::embedder::{EmbedderBackend, Embedding};

    /// all-MiniLM-L6-v2 truncates inputs at 256 word pieces.
    const MAX_SEQ_LEN: usize = 256;

    const DEFAULT_DIM: usize = 384;

    /// ONNX embedding engine.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: EmbeddingCache,
        dimension: usize,
    }

    impl OnnxEmbedder {
        /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
        ///
        /// With the `load-dynamic` ort feature, `ORT_DYLIB_PATH` must point to
        /// libonnxruntime.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::NotFound(format!("model {}", model_path.display())));
            }
            if !tokenizer_path.exists() {
                return Err(Error::NotFound(format!(
                    "tokenizer {}",
                    tokenizer_path.display()
                )));
            }

            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| Error::Inference(format!("session builder: {}", e)))?
                .with_intra_threads(2)
                .map_err(|e| Error::Inference(format!("intra threads: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| Error::Inference(format!("load model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Inference(format!("load tokenizer: {}", e)))?;

            info!("ONNX embedder loaded: dim={}, model={}", DEFAULT_DIM, model_path.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: EmbeddingCache::with_default_capacity(),
                dimension: DEFAULT_DIM,
            })
        }

        fn infer(&self, text: &str) -> Option<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| warn!("Tokenization failed: {}", e))
                .ok()?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let input_ids = &encoding.get_ids()[..seq_len];
            let attention_mask = &encoding.get_attention_mask()[..seq_len];

            let ids: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
            let type_ids = vec![0i64; seq_len];

            let ids = Tensor::from_array(([1usize, seq_len], ids))
                .map_err(|e| warn!("ids tensor: {}", e))
                .ok()?;
            let mask = Tensor::from_array(([1usize, seq_len], mask))
                .map_err(|e| warn!("mask tensor: {}", e))
                .ok()?;
            let type_ids = Tensor::from_array(([1usize, seq_len], type_ids))
                .map_err(|e| warn!("type_ids tensor: {}", e))
                .ok()?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids, mask, type_ids])
                .map_err(|e| warn!("ONNX inference failed: {}", e))
                .ok()?;

            // Either token embeddings [1, seq, dim] or pooled [1, dim].
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| warn!("Output tensor: {}", e))
                .ok()?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            match dims.len() {
                3 => mean_pool(data, attention_mask, dims[2] as usize),
                2 => {
                    let dim = dims[1] as usize;
                    Some(Array1::from_vec(data[..dim].to_vec()))
                }
                _ => {
                    warn!("Unexpected output shape: {:?}", dims);
                    None
                }
            }
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Option<Embedding> {
            if let Some(vector) = self.cache.get(text) {
                return Some(Embedding { vector, cached: true });
            }

            let vector = self.infer(text)?;
            self.cache.insert(text.to_string(), vector.clone());
            Some(Embedding {
                vector,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "all-MiniLM-L6-v2"
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_pool_respects_mask() {
        // Three tokens of dim 2; the last one is padding.
        let data = [1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let pooled = mean_pool(&data, &[1, 1, 0], 2).unwrap();
        assert_eq!(pooled, array![2.0, 3.0]);
    }

    #[test]
    fn test_mean_pool_empty_mask() {
        assert!(mean_pool(&[1.0, 2.0], &[0], 2).is_none());
    }

    #[test]
    fn test_mean_pool_short_buffer() {
        assert!(mean_pool(&[1.0], &[1, 1], 2).is_none());
    }
}
