//! Paper Digest Store: one JSON snapshot per day plus the seen-id list.

pub mod seen;
pub mod snapshot;
pub mod types;

pub use seen::{SeenStore, MAX_SEEN_IDS};
pub use snapshot::SnapshotStore;
pub use types::*;
