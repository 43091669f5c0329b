//! Merge keyword and semantic results into ordered matched/unmatched lists.

use std::cmp::Ordering;

use digest_core::Paper;

use crate::types::{KeywordMatches, MatchMethod, MatchResult, SemanticScores};

/// Classify every paper and order both partitions.
///
/// `matched` is newest first; `unmatched` is by best semantic score,
/// highest first. Ties keep input order.
pub fn merge_results(
    papers: &[Paper],
    keyword: &KeywordMatches,
    semantic: Option<&SemanticScores>,
) -> (Vec<MatchResult>, Vec<MatchResult>) {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for paper in papers {
        let kw_topics = keyword.get(&paper.id);
        let sem_topics = semantic.and_then(|s| s.matched.get(&paper.id));
        let best_score = semantic
            .and_then(|s| s.best.get(&paper.id))
            .copied()
            .unwrap_or(0.0);

        let (method, topics) = match (kw_topics, sem_topics) {
            (Some(kw), Some(sem)) => {
                let mut topics = kw.clone();
                for name in sem.keys() {
                    if !topics.contains(name) {
                        topics.push(name.clone());
                    }
                }
                (MatchMethod::Both, topics)
            }
            (Some(kw), None) => (MatchMethod::Keyword, kw.clone()),
            (None, Some(sem)) => (MatchMethod::Semantic, sem.keys().cloned().collect()),
            (None, None) => (MatchMethod::None, Vec::new()),
        };

        let result = MatchResult {
            paper: paper.clone(),
            matched_topics: topics,
            match_method: method,
            semantic_scores: sem_topics.cloned().unwrap_or_default(),
            best_score,
        };

        if method == MatchMethod::None {
            unmatched.push(result);
        } else {
            matched.push(result);
        }
    }

    // Both sorts are stable.
    matched.sort_by(|a, b| b.paper.published.cmp(&a.paper.published));
    unmatched.sort_by(|a, b| {
        b.best_score
            .partial_cmp(&a.best_score)
            .unwrap_or(Ordering::Equal)
    });

    (matched, unmatched)
}
