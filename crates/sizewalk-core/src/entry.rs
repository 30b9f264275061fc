//! File and directory entry types.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::Serialize;

/// A single file found directly inside a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    name: CompactString,
    path: PathBuf,
    size: u64,
    is_dir: bool,
}

impl FileEntry {
    /// Create a new file entry.
    pub fn new(name: impl Into<CompactString>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            is_dir: false,
        }
    }

    /// File name (not full path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Always `false` for entries built with [`FileEntry::new`].
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// A scanned directory with its immediate files and kept subdirectories.
///
/// The aggregate size is computed once, in [`DirectoryEntry::new`], from the
/// files and children handed to it:
///
/// `size == sum(file sizes) + sum(child sizes)`
///
/// There is no way to change the files, children or size afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    name: CompactString,
    path: PathBuf,
    size: u64,
    files: Vec<FileEntry>,
    children: Vec<DirectoryEntry>,
}

impl DirectoryEntry {
    /// Create a directory entry, sealing its aggregate size.
    ///
    /// The name is derived from the last path component, falling back to the
    /// whole path for roots such as `/`.
    pub fn new(
        path: impl Into<PathBuf>,
        files: Vec<FileEntry>,
        children: Vec<DirectoryEntry>,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::new(path.to_string_lossy()));

        let size = files.iter().map(FileEntry::size).sum::<u64>()
            + children.iter().map(DirectoryEntry::size).sum::<u64>();

        Self {
            name,
            path,
            size,
            files,
            children,
        }
    }

    /// Directory name (not full path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Aggregate size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Always `true`.
    pub fn is_dir(&self) -> bool {
        true
    }

    /// Immediate files, in listing order.
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Kept subdirectories, in discovery order.
    pub fn children(&self) -> &[DirectoryEntry] {
        &self.children
    }

    /// Number of kept immediate subdirectories.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of files in this directory and all kept descendants.
    pub fn file_count(&self) -> u64 {
        self.files.len() as u64 + self.children.iter().map(Self::file_count).sum::<u64>()
    }

    /// Number of kept descendant directories (not counting this one).
    pub fn dir_count(&self) -> u64 {
        self.children.iter().map(|c| c.dir_count() + 1).sum()
    }

    /// Size of the immediate files only.
    pub fn own_size(&self) -> u64 {
        self.files.iter().map(FileEntry::size).sum()
    }

    /// View this directory as a plain entry (name, path, aggregate size).
    pub fn as_file_entry(&self) -> FileEntry {
        FileEntry {
            name: self.name.clone(),
            path: self.path.clone(),
            size: self.size,
            is_dir: true,
        }
    }

    /// Consume the directory, keeping only its children.
    pub fn into_children(self) -> Vec<DirectoryEntry> {
        self.children
    }
}
