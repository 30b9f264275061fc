//! Concurrent directory scanning engine for sizewalk.
//!
//! This crate walks a directory tree, listing each directory once and
//! aggregating sizes bottom-up. Key features:
//!
//! - **Parallel fan-out** per directory via rayon
//! - **Bounded filesystem work**: one admission gate caps in-flight reads
//!   for the whole scan, whatever the tree depth
//! - **Fault isolation**: unreadable subdirectories are dropped and
//!   reported as warnings instead of failing the scan
//! - **Post-aggregation filtering** of directories
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use sizewalk_scan::{ONE_GB, Scanner, flatten_by_size, size_filter};
//!
//! let scanner = Scanner::new();
//! if let Some(root) = scanner.scan("/path/to/scan", size_filter(ONE_GB)).unwrap() {
//!     for dir in flatten_by_size(&root) {
//!         println!("{:>12} {}", dir.size(), dir.path().display());
//!     }
//! }
//! ```
//!
//! # Custom readers and loggers
//!
//! The filesystem and the logger are injected capabilities:
//!
//! ```rust,no_run
//! use sizewalk_scan::{FsReader, ScanConfig, Scanner, TracingLogger, accept_all};
//!
//! let config = ScanConfig::builder().concurrency(4usize).build().unwrap();
//! let scanner = Scanner::with_parts(FsReader, TracingLogger, config).unwrap();
//! let report = scanner.scan_report(".", accept_all()).unwrap();
//!
//! println!("{} bytes, {} warning(s)", report.total_size(), report.warnings.len());
//! ```

mod fanout;
mod gate;
mod logger;
mod progress;
mod reader;
mod scanner;

pub use fanout::FanOut;
pub use gate::{AdmissionGate, Permit};
pub use logger::{Context, Field, ScanLogger, TracingLogger};
pub use progress::ScanProgress;
pub use reader::{DirectoryReader, FsReader, RawEntry};
pub use scanner::{MAX_SCAN_DEPTH, Scanner};

// Re-export core types for convenience
pub use sizewalk_core::{
    DirectoryEntry, FileEntry, FilterPolicy, ONE_GB, ONE_KB, ONE_MB, ScanConfig, ScanError,
    ScanReport, ScanWarning, SizeUnit, WarningKind, accept_all, flatten, flatten_by_size,
    size_filter,
};
