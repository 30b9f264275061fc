//! Error types for scanning operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Path is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory lies deeper than the scan descends.
    #[error("Directory nesting exceeds {limit} levels: {path}")]
    DepthLimit { path: PathBuf, limit: u32 },

    /// Scan was interrupted through its interrupt handle.
    #[error("Operation interrupted")]
    Interrupted,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context, classified by error kind.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. }
            | Self::DepthLimit { path, .. } => Some(path),
            Self::Interrupted | Self::InvalidConfig { .. } => None,
        }
    }

    /// Convert into a non-fatal warning for subtrees below the root.
    pub fn to_warning(&self) -> ScanWarning {
        let path = self.path().map(Path::to_path_buf).unwrap_or_default();
        let kind = match self {
            Self::PermissionDenied { .. } => WarningKind::PermissionDenied,
            Self::DepthLimit { .. } => WarningKind::DepthLimit,
            _ => WarningKind::ReadError,
        };
        ScanWarning::new(path, self.to_string(), kind)
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied listing a directory.
    PermissionDenied,
    /// Error listing a directory.
    ReadError,
    /// Error reading a file's metadata.
    MetadataError,
    /// Directory skipped because it is nested too deep.
    DepthLimit,
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a metadata warning for a file recorded with size 0.
    pub fn metadata_error(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Metadata unavailable, counted as 0 bytes: {}", path.display()),
            path,
            kind: WarningKind::MetadataError,
        }
    }
}
