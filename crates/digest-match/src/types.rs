//! Matcher types.

use std::collections::{BTreeMap, HashMap, HashSet};

use digest_core::config::DEFAULT_EMBEDDING_THRESHOLD;
use digest_core::Paper;
use serde::{Deserialize, Serialize};

/// How a paper was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Term pattern hit only.
    Keyword,
    /// Embedding similarity at or above threshold only.
    Semantic,
    /// Both layers fired.
    Both,
    /// Neither layer fired.
    None,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Semantic => write!(f, "semantic"),
            Self::Both => write!(f, "both"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Paper id → names of topics whose terms matched, in topic order.
pub type KeywordMatches = HashMap<String, Vec<String>>;

/// Scores produced by a semantic layer run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticScores {
    /// Paper id → {topic name → score} for scores at or above threshold.
    pub matched: HashMap<String, BTreeMap<String, f32>>,
    /// Paper id → highest score across all scored topics.
    pub best: HashMap<String, f32>,
}

/// Result of asking the semantic layer to run.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    /// The embedder ran over every candidate.
    Scored(SemanticScores),
    /// Nothing to score: no candidates or no topic with a description.
    Skipped,
    /// No embedding capability, or the embedder failed part way.
    Unavailable,
}

impl SemanticOutcome {
    pub fn scores(&self) -> Option<&SemanticScores> {
        match self {
            Self::Scored(scores) => Some(scores),
            _ => None,
        }
    }

    pub fn status(&self) -> SemanticStatus {
        match self {
            Self::Scored(_) => SemanticStatus::Ran,
            Self::Skipped => SemanticStatus::Skipped,
            Self::Unavailable => SemanticStatus::Unavailable,
        }
    }
}

/// Serializable summary of [`SemanticOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticStatus {
    Ran,
    Skipped,
    Unavailable,
}

/// Classification of one paper for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub paper: Paper,
    /// Deduplicated topic names; empty for unmatched papers.
    pub matched_topics: Vec<String>,
    pub match_method: MatchMethod,
    /// Topic name → score for topics matched semantically.
    pub semantic_scores: BTreeMap<String, f32>,
    /// Highest semantic score across all enabled topics, 0.0 when unscored.
    pub best_score: f32,
}

/// Caller-supplied knobs for [`crate::filter_papers`].
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Cosine similarity threshold in [0, 1].
    pub threshold: f32,
    /// Ids of papers delivered by an earlier run.
    pub seen_ids: HashSet<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_EMBEDDING_THRESHOLD,
            seen_ids: HashSet::new(),
        }
    }
}

/// Output of one classification run.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    /// Newest first.
    pub matched: Vec<MatchResult>,
    /// Closest to the threshold first.
    pub unmatched: Vec<MatchResult>,
    pub semantic: SemanticStatus,
    /// Papers dropped because their id was in the seen set.
    pub seen_excluded: usize,
}

impl FilterOutcome {
    pub fn empty(semantic: SemanticStatus, seen_excluded: usize) -> Self {
        Self {
            matched: Vec::new(),
            unmatched: Vec::new(),
            semantic,
            seen_excluded,
        }
    }

    /// Number of fresh papers classified.
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}
