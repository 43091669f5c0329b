//! Batch runner: classify stored snapshots, write the report, housekeep.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use digest_core::Result;
use digest_infer::SemanticMode;
use digest_match::{filter_papers, FilterOptions, MatchResult, SemanticStatus};
use digest_store::{PruneReport, SeenStore};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

/// Classification of one stored day.
#[derive(Debug, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    /// Papers in the snapshot before seen-id exclusion.
    pub fetched: usize,
    pub matched: Vec<MatchResult>,
    pub unmatched: Vec<MatchResult>,
    pub semantic: SemanticStatus,
}

/// Contents of `report.json`.
#[derive(Debug, Serialize)]
pub struct DigestReport {
    pub generated_at: DateTime<Utc>,
    pub embedding_threshold: f32,
    pub topics: Vec<String>,
    /// Newest date first.
    pub days: Vec<DayReport>,
}

impl DigestReport {
    pub fn matched_count(&self) -> usize {
        self.days.iter().map(|d| d.matched.len()).sum()
    }
}

/// What a run did besides writing the report.
#[derive(Debug)]
pub struct RunSummary {
    pub report_path: PathBuf,
    pub days: usize,
    pub matched: usize,
    /// Newly recorded seen ids (0 when seen tracking is off).
    pub recorded: usize,
    pub pruned: PruneReport,
}

/// Classify up to `max_days` most recent snapshots and write the report.
///
/// With `track_seen`, papers delivered by earlier runs (or by a newer day of
/// this run) are excluded, and newly matched ids are recorded afterwards.
pub fn run(state: &AppState, today: NaiveDate) -> Result<RunSummary> {
    let settings = &state.config.settings;
    let topics = state.registry.read().enabled();
    info!(
        "Topics: {:?}",
        topics.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
    );

    let dates: Vec<NaiveDate> = state
        .snapshots
        .list_dates()?
        .into_iter()
        .take(settings.max_days)
        .collect();
    info!("Data for {} days: {:?}", dates.len(), dates);

    let seen_store = SeenStore::open(&state.config.data_dir);
    let mut seen: HashSet<String> = if settings.track_seen {
        seen_store.load()
    } else {
        HashSet::new()
    };

    let mut days = Vec::with_capacity(dates.len());
    for date in dates {
        let Some(papers) = state.snapshots.load(date)? else {
            continue;
        };
        info!("Filtering {} ({} papers)", date, papers.len());

        let options = FilterOptions {
            threshold: settings.embedding_threshold,
            seen_ids: seen.clone(),
        };
        let outcome = filter_papers(&papers, &topics, state.embedder.as_ref(), &options);
        info!(
            "{}: {} matched, {} unmatched",
            date,
            outcome.matched.len(),
            outcome.unmatched.len()
        );

        if settings.track_seen {
            seen.extend(outcome.matched.iter().map(|r| r.paper.id.clone()));
        }

        days.push(DayReport {
            date,
            fetched: papers.len(),
            matched: outcome.matched,
            unmatched: outcome.unmatched,
            semantic: outcome.semantic,
        });
    }

    let report = DigestReport {
        generated_at: Utc::now(),
        embedding_threshold: settings.embedding_threshold,
        topics: topics.iter().map(|t| t.name.clone()).collect(),
        days,
    };

    let report_path = state.config.report_path();
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
    info!("Written to {}", report_path.display());

    let recorded = if settings.track_seen {
        let delivered = report
            .days
            .iter()
            .flat_map(|d| d.matched.iter().map(|r| r.paper.id.as_str()));
        seen_store.record(delivered)?
    } else {
        0
    };

    let pruned = state.snapshots.prune(settings.retention_days, today)?;

    Ok(RunSummary {
        report_path,
        days: report.days.len(),
        matched: report.matched_count(),
        recorded,
        pruned,
    })
}

/// Result of `paper-digest validate`.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub data_dir: PathBuf,
    pub topics: usize,
    pub enabled_topics: usize,
    pub inert_topics: Vec<String>,
    pub snapshot_dates: Vec<NaiveDate>,
    pub semantic: SemanticMode,
    pub embedding_threshold: f32,
}

/// Inspect configuration, topics and stored data without classifying.
pub fn validate(state: &AppState) -> Result<ValidationReport> {
    let (total, enabled) = {
        let registry = state.registry.read();
        (registry.len(), registry.enabled())
    };
    Ok(ValidationReport {
        data_dir: state.config.data_dir.clone(),
        topics: total,
        enabled_topics: enabled.len(),
        inert_topics: enabled
            .iter()
            .filter(|t| !t.has_terms() && !t.has_description())
            .map(|t| t.name.clone())
            .collect(),
        snapshot_dates: state.snapshots.list_dates()?,
        semantic: SemanticMode::of(state.embedder.as_ref()),
        embedding_threshold: state.config.settings.embedding_threshold,
    })
}

pub fn print_validation(report: &ValidationReport) {
    println!("Data directory:   {}", report.data_dir.display());
    println!(
        "Topics:           {} ({} enabled)",
        report.topics, report.enabled_topics
    );
    for name in &report.inert_topics {
        println!("  warning: '{}' has no terms and no description", name);
    }
    println!("Snapshots:        {}", report.snapshot_dates.len());
    if let Some(newest) = report.snapshot_dates.first() {
        println!("  newest:         {}", newest);
    }
    println!("Semantic layer:   {}", report.semantic);
    println!("Threshold:        {}", report.embedding_threshold);
}
