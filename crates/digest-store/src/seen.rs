//! Ids of papers already delivered, kept in `<data_dir>/seen_ids.json`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use digest_core::Result;
use tracing::{info, warn};

/// Most recent ids kept on disk.
pub const MAX_SEEN_IDS: usize = 2000;

/// Append-only list of delivered paper ids, oldest first.
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("seen_ids.json"),
        }
    }

    fn read_list(&self) -> Vec<String> {
        if !self.path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Seen ids; a missing or unreadable file is an empty set.
    pub fn load(&self) -> HashSet<String> {
        self.read_list().into_iter().collect()
    }

    /// Append ids not yet recorded, keeping the newest [`MAX_SEEN_IDS`].
    /// Returns how many were new.
    pub fn record<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Result<usize> {
        let mut list = self.read_list();
        let mut known: HashSet<String> = list.iter().cloned().collect();

        let mut added = 0;
        for id in ids {
            if known.insert(id.to_string()) {
                list.push(id.to_string());
                added += 1;
            }
        }

        if list.len() > MAX_SEEN_IDS {
            list.drain(..list.len() - MAX_SEEN_IDS);
        }

        std::fs::write(&self.path, serde_json::to_string(&list)?)?;
        info!("Recorded {} new seen ids ({} total)", added, list.len());
        Ok(added)
    }
}
