//! Scan configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::entry::DirectoryEntry;
use crate::filter::{FilterPolicy, size_filter};
use crate::units::{ONE_GB, SizeUnit};

/// Default cap on concurrent directory reads.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default "large directory" threshold: 10 GiB.
pub const DEFAULT_SIZE_THRESHOLD: u64 = 10 * ONE_GB;

/// Configuration for scanning operations.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Maximum number of directory reads in flight across the whole scan.
    #[builder(default = "DEFAULT_CONCURRENCY")]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of worker threads (0 = one per CPU).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Maximum directory depth to descend to (root = 0, None = unlimited).
    ///
    /// Deeper directories are not listed and are reported as warnings.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// What to do with kept descendants of a rejected directory.
    #[builder(default)]
    #[serde(default)]
    pub filter_policy: FilterPolicy,

    /// Include hidden files and directories (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Glob patterns matched against entry names; matches are skipped.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Threshold in bytes for [`ScanConfig::size_filter`].
    #[builder(default = "DEFAULT_SIZE_THRESHOLD")]
    #[serde(default = "default_size_threshold")]
    pub size_threshold: u64,
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_size_threshold() -> u64 {
    DEFAULT_SIZE_THRESHOLD
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }
        Ok(())
    }

    /// Set the size threshold as an amount of `unit`.
    pub fn size_threshold_in(&mut self, amount: u64, unit: SizeUnit) -> &mut Self {
        self.size_threshold(unit.to_bytes(amount))
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Filter keeping directories larger than the configured threshold.
    pub fn size_filter(&self) -> impl Fn(&DirectoryEntry) -> bool + Send + Sync + Copy {
        size_filter(self.size_threshold)
    }

    /// Check whether hidden entries should be skipped for this name.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            threads: 0,
            max_depth: None,
            filter_policy: FilterPolicy::Discard,
            include_hidden: true,
            ignore_patterns: Vec::new(),
            size_threshold: DEFAULT_SIZE_THRESHOLD,
        }
    }
}
