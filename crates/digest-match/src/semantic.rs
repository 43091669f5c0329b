//! Embedding layer: cosine similarity between papers and topic descriptions.
//!
//! Only papers the keyword layer left unresolved are embedded. Any embedder
//! failure degrades the whole layer to [`SemanticOutcome::Unavailable`]; it
//! never drops individual papers.

use std::collections::{BTreeMap, HashMap, HashSet};

use digest_core::{Paper, Topic};
use digest_infer::{EmbedderBackend, Embedding};
use ndarray::{Array1, Array2};
use tracing::{debug, info, warn};

use crate::types::{SemanticOutcome, SemanticScores};

/// Characters of abstract kept in the embedded paper text.
pub const ABSTRACT_CHAR_BUDGET: usize = 512;

/// Added to vector norms before dividing.
pub const NORM_EPSILON: f32 = 1e-9;

/// Text embedded for a paper: title plus a bounded abstract prefix.
pub fn paper_text(paper: &Paper) -> String {
    let prefix: String = paper.abstract_text.chars().take(ABSTRACT_CHAR_BUDGET).collect();
    format!("{}. {}", paper.title, prefix)
}

/// L2-normalize with an epsilon-stabilized denominator.
pub fn normalize(v: &Array1<f32>) -> Array1<f32> {
    let norm = v.dot(v).sqrt();
    v / (norm + NORM_EPSILON)
}

/// Cosine similarity. Zero vectors score 0.0. Mismatched lengths score 0.0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    normalize(a).dot(&normalize(b))
}

/// Round to 3 decimal digits for stable display and comparison.
pub fn round_score(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

/// Stack normalized vectors into a `(rows, dim)` matrix. Fails on any
/// missing embedding or dimension mismatch.
fn normalized_matrix(embeddings: Vec<Option<Embedding>>, dim: usize) -> Option<Array2<f32>> {
    let rows = embeddings.len();
    let mut flat = Vec::with_capacity(rows * dim);
    for embedding in embeddings {
        let vector = embedding?.vector;
        if vector.len() != dim {
            warn!("Embedding dimension {} != {}", vector.len(), dim);
            return None;
        }
        flat.extend(normalize(&vector).iter().copied());
    }
    Array2::from_shape_vec((rows, dim), flat).ok()
}

/// Score unresolved papers against enabled topics with a description.
///
/// Returns `Skipped` without touching the embedder when there is nothing to
/// score, `Unavailable` when the embedder cannot run.
pub fn semantic_match(
    papers: &[Paper],
    topics: &[Topic],
    embedder: &dyn EmbedderBackend,
    threshold: f32,
    already_matched: &HashSet<String>,
) -> SemanticOutcome {
    let topics: Vec<&Topic> = topics
        .iter()
        .filter(|t| t.enabled && t.has_description())
        .collect();
    let candidates: Vec<&Paper> = papers
        .iter()
        .filter(|p| !already_matched.contains(&p.id))
        .collect();

    if candidates.is_empty() || topics.is_empty() {
        debug!(
            "Semantic layer skipped: {} candidates, {} topics",
            candidates.len(),
            topics.len()
        );
        return SemanticOutcome::Skipped;
    }

    if !embedder.is_available() {
        warn!("No embedding backend available, skipping semantic layer");
        return SemanticOutcome::Unavailable;
    }

    info!("Running semantic match on {} papers", candidates.len());
    let dim = embedder.dimension();

    let topic_texts: Vec<&str> = topics.iter().map(|t| t.description.as_str()).collect();
    let paper_texts: Vec<String> = candidates.iter().map(|p| paper_text(p)).collect();
    let paper_refs: Vec<&str> = paper_texts.iter().map(String::as_str).collect();

    let topic_embeddings = embedder.embed_batch(&topic_texts);
    let paper_embeddings = embedder.embed_batch(&paper_refs);
    let reused = topic_embeddings
        .iter()
        .chain(&paper_embeddings)
        .flatten()
        .filter(|e| e.cached)
        .count();
    debug!(
        "{} of {} embeddings served from cache",
        reused,
        topic_embeddings.len() + paper_embeddings.len()
    );

    let topic_matrix = normalized_matrix(topic_embeddings, dim);
    let paper_matrix = normalized_matrix(paper_embeddings, dim);
    let (Some(topic_matrix), Some(paper_matrix)) = (topic_matrix, paper_matrix) else {
        warn!("Embedding failed for part of the batch, skipping semantic layer");
        return SemanticOutcome::Unavailable;
    };

    // (n_papers, n_topics)
    let similarity = paper_matrix.dot(&topic_matrix.t());

    let mut scores = SemanticScores {
        matched: HashMap::new(),
        best: HashMap::with_capacity(candidates.len()),
    };
    for (i, paper) in candidates.iter().enumerate() {
        let mut matched = BTreeMap::new();
        let mut best = f32::NEG_INFINITY;
        for (j, topic) in topics.iter().enumerate() {
            let score = similarity[[i, j]];
            best = best.max(score);
            if score >= threshold {
                matched.insert(topic.name.clone(), round_score(score));
            }
        }
        scores.best.insert(paper.id.clone(), round_score(best));
        if !matched.is_empty() {
            scores.matched.insert(paper.id.clone(), matched);
        }
    }

    SemanticOutcome::Scored(scores)
}
