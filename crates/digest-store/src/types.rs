//! On-disk record types.

use chrono::{DateTime, FixedOffset, NaiveDate};
use digest_core::Paper;
use serde::{Deserialize, Serialize};

/// Contents of `papers/YYYY-MM-DD.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub fetched_at: DateTime<FixedOffset>,
    pub papers: Vec<Paper>,
}

/// Outcome of a prune pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub removed: Vec<NaiveDate>,
    pub kept: usize,
}
