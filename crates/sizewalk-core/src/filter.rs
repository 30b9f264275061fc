//! Directory filter predicates.
//!
//! A filter sees each directory once, after its aggregate size is final.

use serde::{Deserialize, Serialize};

use crate::entry::DirectoryEntry;

/// What happens to the kept descendants of a directory the filter rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterPolicy {
    /// Drop the whole subtree, including descendants that passed the
    /// filter. Only the largest qualifying ancestor is reported.
    #[default]
    Discard,
    /// Drop only the rejected directory and its own files; its kept
    /// children move up into the nearest kept ancestor.
    Promote,
}

/// Filter that keeps every directory.
pub fn accept_all() -> impl Fn(&DirectoryEntry) -> bool + Send + Sync + Copy {
    |_| true
}

/// Filter that keeps directories whose aggregate size exceeds `threshold` bytes.
pub fn size_filter(threshold: u64) -> impl Fn(&DirectoryEntry) -> bool + Send + Sync + Copy {
    move |dir| dir.size() > threshold
}
