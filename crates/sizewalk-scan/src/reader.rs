//! Directory listing capability.

use std::ffi::OsString;
use std::io;
use std::path::Path;

/// One immediate entry of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry name as stored on disk.
    pub name: OsString,
    /// Whether the entry is a directory (symlinks never are).
    pub is_dir: bool,
    /// Size in bytes, `None` if the metadata could not be read.
    pub size: Option<u64>,
}

impl RawEntry {
    /// A file entry with a known size.
    pub fn file(name: impl Into<OsString>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size: Some(size),
        }
    }

    /// A subdirectory entry.
    pub fn dir(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
        }
    }
}

/// Lists the immediate entries of a directory.
///
/// Implementations are shared by reference across every concurrent scan
/// task, so they must be `Send + Sync` and must not rely on `&mut self`.
pub trait DirectoryReader: Send + Sync {
    /// Read the immediate entries of `path`.
    fn read_entries(&self, path: &Path) -> io::Result<Vec<RawEntry>>;
}

impl<R: DirectoryReader + ?Sized> DirectoryReader for &R {
    fn read_entries(&self, path: &Path) -> io::Result<Vec<RawEntry>> {
        (**self).read_entries(path)
    }
}

impl<R: DirectoryReader + ?Sized> DirectoryReader for std::sync::Arc<R> {
    fn read_entries(&self, path: &Path) -> io::Result<Vec<RawEntry>> {
        (**self).read_entries(path)
    }
}

/// Reads directories from the local filesystem.
///
/// Symbolic links are reported with their own metadata and are never
/// followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl FsReader {
    /// Create a new filesystem reader.
    pub fn new() -> Self {
        Self
    }
}

impl DirectoryReader for FsReader {
    fn read_entries(&self, path: &Path) -> io::Result<Vec<RawEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            let size = if is_dir {
                None
            } else {
                entry.metadata().ok().map(|m| m.len())
            };
            entries.push(RawEntry {
                name: entry.file_name(),
                is_dir,
                size,
            });
        }
        Ok(entries)
    }
}
