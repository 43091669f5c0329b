//! Paper and topic records shared by every crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized metadata for one research paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Short arXiv identifier, e.g. `2401.12345`.
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Canonical abstract page URL.
    #[serde(default)]
    pub url: String,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Paper {
    /// Abstract page URL for an identifier.
    pub fn abs_url(id: &str) -> String {
        format!("https://arxiv.org/abs/{}", id)
    }

    /// PDF URL for this paper.
    pub fn pdf_url(&self) -> String {
        format!("https://arxiv.org/pdf/{}", self.id)
    }
}

/// A user-defined interest topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    /// Literal terms for the keyword layer.
    #[serde(default)]
    pub terms: Vec<String>,
    /// Anchor text for the embedding layer.
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Topic {
    /// Whether the keyword layer can ever fire for this topic.
    pub fn has_terms(&self) -> bool {
        self.terms.iter().any(|t| !t.trim().is_empty())
    }

    /// Whether the topic takes part in semantic matching.
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}
