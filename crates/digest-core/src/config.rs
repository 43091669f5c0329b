//! Configuration and data directory management.
//!
//! Settings come from `<data_dir>/config.json` when it exists, otherwise from
//! built-in defaults. A few environment variables override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::topics::default_topics;
use crate::types::Topic;

/// Default cosine similarity threshold for the semantic layer.
pub const DEFAULT_EMBEDDING_THRESHOLD: f32 = 0.35;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Pipeline settings, the `config` object of `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSettings {
    /// arXiv categories the external fetcher queries.
    pub categories: Vec<String>,
    pub max_results: usize,
    pub embedding_threshold: f32,
    /// Snapshots older than this are pruned after each run.
    pub retention_days: u32,
    /// Number of most recent days classified per run.
    pub max_days: usize,
    /// Exclude previously delivered papers and remember new ones.
    pub track_seen: bool,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            categories: vec!["cs.AI".into(), "cs.LG".into(), "cs.CL".into()],
            max_results: 2000,
            embedding_threshold: DEFAULT_EMBEDDING_THRESHOLD,
            retention_days: 90,
            max_days: 7,
            track_seen: false,
        }
    }
}

/// A topic as written in `config.json`. The id may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl TopicEntry {
    /// Resolve into a [`Topic`], deriving the id from the name when absent.
    pub fn into_topic(self) -> Topic {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| topic_id_from_name(&self.name));
        Topic {
            id,
            name: self.name,
            terms: self.terms,
            description: self.description,
            enabled: self.enabled.unwrap_or(true),
        }
    }
}

/// `"Symbolic AI"` → `"symbolic-ai"`.
pub fn topic_id_from_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    topics: Option<Vec<TopicEntry>>,
    #[serde(default)]
    config: Option<DigestSettings>,
}

/// Top-level Paper Digest configuration.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// HTTP server port.
    pub port: u16,
    /// Root data directory (snapshots, seen ids, report).
    pub data_dir: PathBuf,
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub model_dir: PathBuf,
    pub settings: DigestSettings,
    /// Every configured topic, enabled or not.
    pub topics: Vec<Topic>,
}

impl DigestConfig {
    /// Load `config.json` from the data directory, falling back to defaults.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let path = data_dir.join(CONFIG_FILE);
        let file = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let parsed: ConfigFile = serde_json::from_str(&raw)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            info!("Loaded config from {}", path.display());
            parsed
        } else {
            info!("No {} found, using default config", path.display());
            ConfigFile::default()
        };

        let topics = match file.topics {
            Some(entries) => entries.into_iter().map(TopicEntry::into_topic).collect(),
            None => default_topics(),
        };

        let mut settings = file.config.unwrap_or_default();
        settings.embedding_threshold = clamp_threshold(settings.embedding_threshold);

        Ok(Self {
            port: 3003,
            model_dir: data_dir.join("models"),
            data_dir,
            settings,
            topics,
        })
    }

    /// Load from the data directory, then apply `PORT` and
    /// `DIGEST_EMBEDDING_THRESHOLD` overrides.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load(data_dir)?;

        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        if let Ok(raw) = std::env::var("DIGEST_EMBEDDING_THRESHOLD") {
            match raw.parse::<f32>() {
                Ok(t) => config.settings.embedding_threshold = clamp_threshold(t),
                Err(_) => warn!("Ignoring invalid DIGEST_EMBEDDING_THRESHOLD={}", raw),
            }
        }

        Ok(config)
    }

    /// Path of the generated report.
    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join("report.json")
    }
}

/// Replace the `topics` array of `<data_dir>/config.json`, leaving the rest
/// of the file untouched. Creates the file when missing.
pub fn save_topics(data_dir: &Path, topics: &[Topic]) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let mut doc = if path.exists() {
        let raw = std::fs::read_to_string(&path)?;
        serde_json::from_str::<serde_json::Value>(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
    } else {
        serde_json::json!({})
    };
    let Some(fields) = doc.as_object_mut() else {
        return Err(Error::Config(format!("{}: expected a JSON object", path.display())));
    };
    fields.insert("topics".to_string(), serde_json::to_value(topics)?);

    std::fs::create_dir_all(data_dir)?;
    std::fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
    info!("Saved {} topics -> {}", topics.len(), path.display());
    Ok(())
}

/// Clamp to [0, 1]; NaN falls back to the default.
pub fn clamp_threshold(t: f32) -> f32 {
    if t.is_nan() {
        return DEFAULT_EMBEDDING_THRESHOLD;
    }
    t.clamp(0.0, 1.0)
}
