//! Topic matching: keyword layer, embedding layer, merge.
//!
//! A paper passes if either layer fires. The embedding layer only looks at
//! papers the keyword layer did not catch, and is skipped entirely when no
//! embedder is available.

pub mod lexical;
pub mod merge;
pub mod semantic;
pub mod types;

pub use lexical::{keyword_match, LexicalMatcher, STEM_SUFFIXES};
pub use merge::merge_results;
pub use semantic::{cosine_similarity, semantic_match};
pub use types::*;

use std::collections::HashSet;

use digest_core::{Paper, Topic};
use digest_infer::EmbedderBackend;
use tracing::info;

/// Drop papers in the seen set and repeated ids. Returns the fresh papers in
/// input order and the number excluded as seen.
pub fn fresh_papers(papers: &[Paper], seen_ids: &HashSet<String>) -> (Vec<Paper>, usize) {
    let mut kept = HashSet::with_capacity(papers.len());
    let mut excluded = 0;
    let mut fresh = Vec::with_capacity(papers.len());
    for paper in papers {
        if seen_ids.contains(&paper.id) {
            excluded += 1;
            continue;
        }
        if kept.insert(paper.id.as_str()) {
            fresh.push(paper.clone());
        }
    }
    (fresh, excluded)
}

/// Classify papers against topics.
///
/// Disabled topics are dropped here and take no part in either layer.
pub fn filter_papers(
    papers: &[Paper],
    topics: &[Topic],
    embedder: &dyn EmbedderBackend,
    options: &FilterOptions,
) -> FilterOutcome {
    let enabled: Vec<Topic> = topics.iter().filter(|t| t.enabled).cloned().collect();

    let (fresh, excluded) = fresh_papers(papers, &options.seen_ids);
    info!("{} fresh papers (excluded {} seen)", fresh.len(), excluded);
    if fresh.is_empty() {
        return FilterOutcome::empty(SemanticStatus::Skipped, excluded);
    }

    let keyword = keyword_match(&fresh, &enabled);
    info!("Keyword layer matched {} papers", keyword.len());

    let resolved: HashSet<String> = keyword.keys().cloned().collect();
    let semantic = semantic_match(&fresh, &enabled, embedder, options.threshold, &resolved);
    if let Some(scores) = semantic.scores() {
        info!("Semantic layer matched {} additional papers", scores.matched.len());
    }

    let (matched, unmatched) = merge_results(&fresh, &keyword, semantic.scores());
    info!("{} matched, {} unmatched", matched.len(), unmatched.len());

    FilterOutcome {
        matched,
        unmatched,
        semantic: semantic.status(),
        seen_excluded: excluded,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::paper_text;
    use crate::test_support::{paper, topic, TableEmbedder};
    use digest_infer::NoopEmbedder;

    fn ids(results: &[MatchResult]) -> Vec<&str> {
        results.iter().map(|r| r.paper.id.as_str()).collect()
    }

    #[test]
    fn test_embedder_unavailable_scenario() {
        let topics = vec![topic("Symbolic AI", &["symbolic"], "neural+logic hybrids")];
        let papers: Vec<Paper> = (0..10)
            .map(|i| {
                let title = if i == 3 || i == 7 { "Symbolic planning" } else { "Vision transformers" };
                paper(&format!("p{}", i), title, "abstract", i)
            })
            .collect();

        let outcome = filter_papers(&papers, &topics, &NoopEmbedder::new(384), &FilterOptions::default());

        assert_eq!(outcome.semantic, SemanticStatus::Unavailable);
        assert_eq!(outcome.matched.len(), 2);
        assert!(outcome.matched.iter().all(|r| r.match_method == MatchMethod::Keyword));
        assert_eq!(ids(&outcome.matched), vec!["p7", "p3"]);
        assert_eq!(outcome.unmatched.len(), 8);
        assert!(outcome.unmatched.iter().all(|r| r.best_score == 0.0));
        assert_eq!(
            ids(&outcome.unmatched),
            vec!["p0", "p1", "p2", "p4", "p5", "p6", "p8", "p9"]
        );
    }

    #[test]
    fn test_seen_ids_excluded() {
        let topics = vec![topic("A", &["alpha"], "")];
        let papers = vec![
            paper("p1", "alpha", "", 1),
            paper("p2", "alpha", "", 2),
            paper("p3", "beta", "", 3),
        ];
        let options = FilterOptions {
            seen_ids: ["p2".to_string()].into_iter().collect(),
            ..FilterOptions::default()
        };

        let outcome = filter_papers(&papers, &topics, &NoopEmbedder::new(384), &options);
        assert_eq!(outcome.seen_excluded, 1);
        assert_eq!(ids(&outcome.matched), vec!["p1"]);
        assert_eq!(ids(&outcome.unmatched), vec!["p3"]);
    }

    #[test]
    fn test_partition_is_complete_and_exclusive() {
        let topics = vec![topic("A", &["alpha"], "topic a")];
        let papers = vec![
            paper("p1", "alpha", "", 1),
            paper("p2", "gamma", "", 2),
            paper("p2", "gamma again", "", 2),
            paper("p3", "delta", "", 3),
        ];
        let embedder = TableEmbedder::new(2)
            .with("topic a", &[1.0, 0.0])
            .with(&paper_text(&papers[1]), &[0.9, 0.435_889_9])
            .with(&paper_text(&papers[3]), &[0.1, 0.994_987_4]);

        let outcome = filter_papers(&papers, &topics, &embedder, &FilterOptions::default());
        assert_eq!(outcome.semantic, SemanticStatus::Ran);

        let mut all: Vec<&str> = ids(&outcome.matched);
        all.extend(ids(&outcome.unmatched));
        all.sort();
        assert_eq!(all, vec!["p1", "p2", "p3"]);

        assert_eq!(ids(&outcome.matched), vec!["p2", "p1"]);
        assert_eq!(outcome.matched[0].match_method, MatchMethod::Semantic);
        assert_eq!(outcome.unmatched[0].paper.id, "p3");
        assert!((outcome.unmatched[0].best_score - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_keyword_hits_are_not_embedded() {
        let topics = vec![topic("A", &["alpha"], "topic a")];
        let papers = vec![paper("p1", "alpha", "", 1)];
        let embedder = TableEmbedder::new(2).with("topic a", &[1.0, 0.0]);

        let outcome = filter_papers(&papers, &topics, &embedder, &FilterOptions::default());
        assert_eq!(outcome.semantic, SemanticStatus::Skipped);
        assert_eq!(embedder.calls(), 0);
        assert_eq!(outcome.matched[0].match_method, MatchMethod::Keyword);
    }

    #[test]
    fn test_disabled_topic_contributes_nothing() {
        let mut off = topic("Off", &["alpha"], "topic off");
        off.enabled = false;
        let papers = vec![paper("p1", "alpha", "", 1)];
        let embedder = TableEmbedder::new(2).with("topic off", &[1.0, 0.0]);

        let outcome = filter_papers(&papers, &[off], &embedder, &FilterOptions::default());
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.unmatched[0].best_score, 0.0);
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = filter_papers(&[], &[], &NoopEmbedder::new(384), &FilterOptions::default());
        assert_eq!(outcome.total(), 0);

        let papers = vec![paper("p1", "alpha", "", 1)];
        let outcome = filter_papers(&papers, &[], &NoopEmbedder::new(384), &FilterOptions::default());
        assert!(outcome.matched.is_empty());
        assert_eq!(ids(&outcome.unmatched), vec!["p1"]);
    }

    #[test]
    fn test_idempotent_output() {
        let topics = vec![
            topic("A", &["alpha"], "topic a"),
            topic("B", &["beta"], "topic b"),
        ];
        let papers: Vec<Paper> = (0..6)
            .map(|i| {
                let title = ["alpha", "beta", "alpha beta", "none", "nothing", "zero"][i as usize];
                paper(&format!("p{}", i), title, "", i % 3)
            })
            .collect();

        let first = filter_papers(&papers, &topics, &NoopEmbedder::new(384), &FilterOptions::default());
        let second = filter_papers(&papers, &topics, &NoopEmbedder::new(384), &FilterOptions::default());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
