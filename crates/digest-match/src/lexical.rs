//! Keyword layer: per-topic term patterns with crude suffix stemming.
//!
//! Each term matches on word boundaries, case-insensitively, optionally
//! followed by one suffix from [`STEM_SUFFIXES`]. This is not a linguistic
//! stemmer: "graph" does not match "graphical", "learn" does not match
//! "learnt". Terms are escaped, so metacharacters are literal text.

use std::collections::HashMap;

use digest_core::{Paper, Topic};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::types::KeywordMatches;

/// Optional suffixes accepted after every term.
pub const STEM_SUFFIXES: &[&str] = &["ing", "ed", "s", "er", "ly", "tion", "ation", "ations"];

static SUFFIX_GROUP: Lazy<String> = Lazy::new(|| format!("(?:{})?", STEM_SUFFIXES.join("|")));

/// Compile one term. Blank terms yield None.
pub fn term_pattern(term: &str) -> Option<Regex> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return None;
    }
    let pattern = format!(r"(?i)\b{}{}\b", regex::escape(&term), SUFFIX_GROUP.as_str());
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Skipping term '{}': {}", term, e);
            None
        }
    }
}

struct CompiledTopic {
    name: String,
    patterns: Vec<Regex>,
}

/// Compiled patterns for a set of enabled topics.
pub struct LexicalMatcher {
    topics: Vec<CompiledTopic>,
}

impl LexicalMatcher {
    /// Compile patterns for every enabled topic, in topic order.
    pub fn new(topics: &[Topic]) -> Self {
        let topics = topics
            .iter()
            .filter(|t| t.enabled)
            .map(|t| CompiledTopic {
                name: t.name.clone(),
                patterns: t.terms.iter().filter_map(|term| term_pattern(term)).collect(),
            })
            .collect();
        Self { topics }
    }

    /// Names of topics with at least one matching term, without repeats.
    pub fn match_paper(&self, paper: &Paper) -> Vec<String> {
        let haystack = format!("{} {}", paper.title, paper.abstract_text).to_lowercase();
        let mut names: Vec<String> = Vec::new();
        for topic in &self.topics {
            if names.contains(&topic.name) {
                continue;
            }
            if topic.patterns.iter().any(|re| re.is_match(&haystack)) {
                names.push(topic.name.clone());
            }
        }
        names
    }

    /// Paper id → matched topic names. Papers without hits are left out.
    pub fn match_papers(&self, papers: &[Paper]) -> KeywordMatches {
        let mut results = HashMap::new();
        for paper in papers {
            let matched = self.match_paper(paper);
            if !matched.is_empty() {
                results.insert(paper.id.clone(), matched);
            }
        }
        results
    }
}

/// Run the keyword layer over `papers`.
pub fn keyword_match(papers: &[Paper], topics: &[Topic]) -> KeywordMatches {
    LexicalMatcher::new(topics).match_papers(papers)
}
