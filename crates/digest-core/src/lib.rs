//! Paper Digest Core: paper/topic model, topic registry, configuration.

pub mod config;
pub mod error;
pub mod topics;
pub mod types;

pub use config::{DigestConfig, DigestSettings, TopicEntry};
pub use error::{Error, Result};
pub use topics::TopicRegistry;
pub use types::{Paper, Topic};
