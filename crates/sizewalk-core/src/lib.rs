//! Core types for sizewalk.
//!
//! This crate provides the data structures shared by the scanner and its
//! consumers: file and directory entries, scan configuration, errors,
//! filter predicates and the flattened size-ordered view.

mod config;
mod entry;
mod error;
mod filter;
mod flatten;
mod report;
mod units;

pub use config::{DEFAULT_CONCURRENCY, DEFAULT_SIZE_THRESHOLD, ScanConfig, ScanConfigBuilder};
pub use entry::{DirectoryEntry, FileEntry};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use filter::{FilterPolicy, accept_all, size_filter};
pub use flatten::{flatten, flatten_by_size};
pub use report::ScanReport;
pub use units::{ByteSize, ONE_GB, ONE_KB, ONE_MB, ParseSizeError, SizeUnit, parse_size};
