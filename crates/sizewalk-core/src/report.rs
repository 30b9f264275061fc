//! Scan result container.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::entry::DirectoryEntry;
use crate::error::{ScanWarning, WarningKind};
use crate::flatten::flatten_by_size;

/// A finished scan: the filtered tree plus what went wrong along the way.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Root directory, or `None` when the filter rejected it.
    pub root: Option<DirectoryEntry>,

    /// Absolute root path that was scanned.
    pub root_path: PathBuf,

    /// When this scan finished.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Subtrees and files that could not be read.
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    /// Create a new report.
    pub fn new(
        root: Option<DirectoryEntry>,
        root_path: PathBuf,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            root,
            root_path,
            scanned_at: SystemTime::now(),
            scan_duration,
            warnings,
        }
    }

    /// Aggregate size of the root, 0 when it was filtered out.
    pub fn total_size(&self) -> u64 {
        self.root.as_ref().map_or(0, DirectoryEntry::size)
    }

    /// Kept directories, largest first.
    pub fn largest_dirs(&self) -> Vec<&DirectoryEntry> {
        self.root.as_ref().map(flatten_by_size).unwrap_or_default()
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether some directory below the root could not be listed.
    pub fn is_partial(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.kind != WarningKind::MetadataError)
    }
}
