//! Dated paper snapshots under `<data_dir>/papers/YYYY-MM-DD.json`.
//!
//! Snapshots are written by the external fetcher (or `save`) and read back by
//! the pipeline. Files whose name is not a date are ignored.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate, Utc};
use digest_core::{Error, Paper, Result};
use tracing::{debug, info};

use crate::types::{PruneReport, Snapshot};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Directory of per-day snapshot files.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open (creating if needed) `<data_dir>/papers`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref().join("papers");
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format(DATE_FORMAT)))
    }

    /// Write papers for `date`, replacing any existing snapshot.
    pub fn save(&self, date: NaiveDate, papers: &[Paper]) -> Result<()> {
        let snapshot = Snapshot {
            date,
            fetched_at: Utc::now().into(),
            papers: papers.to_vec(),
        };
        let path = self.path_for(date);
        std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
        info!("Saved {} papers -> {}", papers.len(), path.display());
        Ok(())
    }

    /// Papers for `date`, or None if that day was never saved.
    pub fn load(&self, date: NaiveDate) -> Result<Option<Vec<Paper>>> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded {} papers <- {}", snapshot.papers.len(), path.display());
        Ok(Some(snapshot.papers))
    }

    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.path_for(date).exists()
    }

    /// Every saved date, newest first.
    pub fn list_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(date) = parse_snapshot_name(&entry.file_name().to_string_lossy()) {
                dates.push(date);
            }
        }
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    /// Newest snapshot, if any.
    pub fn latest(&self) -> Result<Option<(NaiveDate, Vec<Paper>)>> {
        let Some(date) = self.list_dates()?.into_iter().next() else {
            return Ok(None);
        };
        Ok(self.load(date)?.map(|papers| (date, papers)))
    }

    /// Delete snapshots dated before `today - retention_days`.
    ///
    /// A retention reaching past the earliest representable date prunes nothing.
    pub fn prune(&self, retention_days: u32, today: NaiveDate) -> Result<PruneReport> {
        let cutoff = today.checked_sub_days(Days::new(u64::from(retention_days)));
        let mut report = PruneReport::default();

        for date in self.list_dates()? {
            if cutoff.is_some_and(|cutoff| date < cutoff) {
                std::fs::remove_file(self.path_for(date))?;
                info!("Pruned {} (older than {} days)", date, retention_days);
                report.removed.push(date);
            } else {
                report.kept += 1;
            }
        }

        if report.removed.is_empty() {
            info!("No snapshots to prune (retention: {} days)", retention_days);
        }
        Ok(report)
    }
}

/// `2026-02-27.json` → 2026-02-27.
fn parse_snapshot_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(".json")?;
    if stem.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, DATE_FORMAT).unwrap()
    }

    fn paper(id: &str) -> Paper {
        Paper {
            id: id.to_string(),
            title: format!("Title {}", id),
            abstract_text: "Abstract".to_string(),
            authors: vec!["A".to_string()],
            url: Paper::abs_url(id),
            published: Utc.with_ymd_and_hms(2026, 2, 27, 0, 0, 0).unwrap(),
            categories: vec!["cs.AI".to_string()],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        let date = day("2026-02-27");

        assert!(store.load(date).unwrap().is_none());
        assert!(!store.has_date(date));

        store.save(date, &[paper("2502.00001"), paper("2502.00002")]).unwrap();
        assert!(store.has_date(date));
        let loaded = store.load(date).unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], paper("2502.00001"));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        let date = day("2026-02-27");

        store.save(date, &[paper("a"), paper("b")]).unwrap();
        store.save(date, &[paper("c")]).unwrap();
        assert_eq!(store.load(date).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_list_dates_newest_first_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.save(day("2026-02-25"), &[]).unwrap();
        store.save(day("2026-02-27"), &[]).unwrap();
        store.save(day("2026-02-26"), &[]).unwrap();
        std::fs::write(store.dir().join("notes.json"), "{}").unwrap();
        std::fs::write(store.dir().join("2026-13-40.json"), "{}").unwrap();

        let dates = store.list_dates().unwrap();
        assert_eq!(dates, vec![day("2026-02-27"), day("2026-02-26"), day("2026-02-25")]);

        let (latest, _) = store.latest().unwrap().unwrap();
        assert_eq!(latest, day("2026-02-27"));
    }

    #[test]
    fn test_prune() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.save(day("2026-01-01"), &[]).unwrap();
        store.save(day("2026-01-20"), &[]).unwrap();
        store.save(day("2026-01-31"), &[]).unwrap();

        // Cutoff is 2026-01-20: strictly older files go.
        let report = store.prune(11, day("2026-01-31")).unwrap();
        assert_eq!(report.removed, vec![day("2026-01-01")]);
        assert_eq!(report.kept, 2);
        assert!(!store.has_date(day("2026-01-01")));
        assert!(store.has_date(day("2026-01-20")));
    }

    #[test]
    fn test_prune_with_huge_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.save(day("1999-01-01"), &[]).unwrap();
        store.save(day("2026-02-27"), &[]).unwrap();

        let report = store.prune(200_000_000, day("2026-02-27")).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.kept, 2);
        assert!(store.has_date(day("1999-01-01")));
    }

    #[test]
    fn test_corrupt_snapshot_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        std::fs::write(store.dir().join("2026-02-27.json"), "{\"papers\": 3}").unwrap();
        match store.load(day("2026-02-27")) {
            Err(Error::Storage(msg)) => assert!(msg.contains("2026-02-27.json")),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[test]
    fn test_latest_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        assert!(store.latest().unwrap().is_none());
    }
}
