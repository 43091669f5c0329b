//! Topic registry: validated topic definitions and built-in defaults.

use std::collections::HashSet;

use tracing::warn;

use crate::error::{Error, Result};
use crate::types::Topic;

/// Validated, ordered set of topics.
#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    topics: Vec<Topic>,
}

impl TopicRegistry {
    /// Validate and register topics, keeping their order.
    ///
    /// Empty names and duplicate ids are rejected. A topic with neither terms
    /// nor a description is kept but can never match.
    pub fn new(topics: Vec<Topic>) -> Result<Self> {
        let mut ids = HashSet::with_capacity(topics.len());
        for topic in &topics {
            if topic.name.trim().is_empty() {
                return Err(Error::InvalidTopic(format!(
                    "topic '{}' has an empty name",
                    topic.id
                )));
            }
            if !ids.insert(topic.id.as_str()) {
                return Err(Error::InvalidTopic(format!("duplicate topic id '{}'", topic.id)));
            }
            if !topic.has_terms() && !topic.has_description() {
                warn!(
                    "Topic '{}' has no terms and no description; it will never match",
                    topic.name
                );
            }
        }
        Ok(Self { topics })
    }

    pub fn all(&self) -> &[Topic] {
        &self.topics
    }

    /// Enabled topics, in registry order.
    pub fn enabled(&self) -> Vec<Topic> {
        self.topics.iter().filter(|t| t.enabled).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

fn topic(id: &str, name: &str, terms: &[&str], description: &str) -> Topic {
    Topic {
        id: id.to_string(),
        name: name.to_string(),
        terms: terms.iter().map(|t| t.to_string()).collect(),
        description: description.to_string(),
        enabled: true,
    }
}

/// Topics used when no configuration file provides any.
pub fn default_topics() -> Vec<Topic> {
    vec![
        topic(
            "artificial-consciousness",
            "Artificial Consciousness",
            &[
                "artificial consciousness", "machine consciousness", "conscious AI",
                "sentience", "phenomenal experience", "qualia", "self-awareness",
                "subjective experience", "integrated information theory", "IIT",
                "global workspace theory", "GWT", "higher-order theory",
                "cognitive architecture", "inner experience", "awareness",
            ],
            "Papers about machine consciousness, subjective experience, and theories of mind applied to AI systems",
        ),
        topic(
            "test-time-learning",
            "Test-Time Learning",
            &[
                "test-time learning", "test-time training", "TTL", "TTT",
                "test-time compute", "inference-time compute", "inference-time scaling",
                "test-time adaptation", "test-time augmentation",
                "chain of thought", "CoT", "self-consistency",
                "tree of thought", "ToT", "best-of-N", "majority voting",
                "slow thinking", "extended thinking", "reasoning model",
                "Monte Carlo tree search", "MCTS", "search at inference",
            ],
            "Papers about leveraging more computation at inference time to improve model performance, including reasoning models and search-based methods",
        ),
        topic(
            "symbolic",
            "Symbolic AI",
            &[
                "symbolic", "neurosymbolic", "neuro-symbolic",
                "symbolic reasoning", "knowledge graph",
                "formal verification", "theorem proving", "automated reasoning",
                "first-order logic", "FOL", "constraint satisfaction",
                "program synthesis", "rule-based", "knowledge representation",
                "ontology", "inductive logic programming", "ILP",
                "symbolic regression", "hybrid reasoning",
            ],
            "Papers combining neural networks with symbolic reasoning, logic, or structured knowledge representations",
        ),
    ]
}
