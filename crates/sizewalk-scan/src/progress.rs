//! Scan progress reporting.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

/// How many directories pass between progress broadcasts.
const BROADCAST_EVERY: u64 = 256;

/// Progress information during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanProgress {
    /// Number of directories listed so far.
    pub dirs_scanned: u64,
    /// Number of files recorded so far.
    pub files_scanned: u64,
    /// Total bytes of recorded files.
    pub bytes_scanned: u64,
    /// Number of warnings so far.
    pub errors_count: u64,
    /// Most recently listed directory.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            dirs_scanned: 0,
            files_scanned: 0,
            bytes_scanned: 0,
            errors_count: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items scanned (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress counters shared by every task of one scan.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    dirs_scanned: AtomicU64,
    files_scanned: AtomicU64,
    bytes_scanned: AtomicU64,
    errors_count: AtomicU64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            dirs_scanned: AtomicU64::new(0),
            files_scanned: AtomicU64::new(0),
            bytes_scanned: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
        }
    }

    pub fn record_files(&self, count: u64, bytes: u64) {
        self.files_scanned.fetch_add(count, Ordering::Relaxed);
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a listed directory, broadcasting a snapshot periodically.
    pub fn record_dir(&self, path: &Path, tx: &broadcast::Sender<ScanProgress>) {
        let count = self.dirs_scanned.fetch_add(1, Ordering::Relaxed) + 1;
        if count % BROADCAST_EVERY == 0 {
            // No subscribers is fine
            let _ = tx.send(self.snapshot(path));
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self, current_path: &Path) -> ScanProgress {
        ScanProgress {
            dirs_scanned: self.dirs_scanned.load(Ordering::Relaxed),
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            errors_count: self.errors_count.load(Ordering::Relaxed),
            current_path: current_path.to_path_buf(),
            elapsed: self.elapsed(),
        }
    }
}
