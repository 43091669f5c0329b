//! Bounded LRU cache of text embeddings.
//!
//! Topic descriptions are the same for every day classified in a run, so
//! they are embedded once per process. Default capacity: 4096 entries.

use std::collections::{HashMap, VecDeque};

use ndarray::Array1;
use parking_lot::Mutex;

/// Thread-safe LRU cache keyed by the exact input text.
pub struct EmbeddingCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<String, Array1<f32>>,
    /// Least recently used at the front.
    recency: VecDeque<String>,
    capacity: usize,
}

impl CacheInner {
    fn touch(&mut self, text: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == text) {
            if let Some(key) = self.recency.remove(pos) {
                self.recency.push_back(key);
            }
        }
    }
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity),
                recency: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(4096)
    }

    /// Cached vector for `text`, refreshing its recency.
    pub fn get(&self, text: &str) -> Option<Array1<f32>> {
        let mut inner = self.inner.lock();
        let vector = inner.entries.get(text).cloned()?;
        inner.touch(text);
        Some(vector)
    }

    /// Insert or replace, evicting the least recently used entry when full.
    pub fn insert(&self, text: String, vector: Array1<f32>) {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&text) {
            inner.touch(&text);
            inner.entries.insert(text, vector);
            return;
        }

        if inner.entries.len() >= inner.capacity {
            if let Some(oldest) = inner.recency.pop_front() {
                inner.entries.remove(&oldest);
            }
        }

        inner.recency.push_back(text.clone());
        inner.entries.insert(text, vector);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
