//! Recursive parallel directory-size scanner.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::broadcast;

use sizewalk_core::{
    DirectoryEntry, FileEntry, FilterPolicy, ScanConfig, ScanError, ScanReport, ScanWarning,
};

use crate::fanout::FanOut;
use crate::gate::AdmissionGate;
use crate::logger::{ScanLogger, TracingLogger};
use crate::progress::{ProgressTracker, ScanProgress};
use crate::reader::{DirectoryReader, FsReader, RawEntry};

/// Deepest directory level any scan descends to, whatever `max_depth` says.
pub const MAX_SCAN_DEPTH: u32 = 4096;

/// Stack size of scan worker threads.
///
/// Every directory level nests one `build` call and its rayon frames on the
/// same thread, so this must hold `MAX_SCAN_DEPTH` levels with room to spare.
const SCAN_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Scans a directory tree, one parallel task per subdirectory.
///
/// Every scan shares a single [`AdmissionGate`] of `config.concurrency`
/// permits across all depths, so at most that many directory reads are in
/// flight at once. A directory below the root that cannot be listed is
/// dropped from the result and recorded as a warning; only a failure to
/// list the root itself fails the scan.
pub struct Scanner<R = FsReader, L = TracingLogger> {
    reader: R,
    logger: L,
    config: ScanConfig,
    ignore: GlobSet,
    interrupted: Arc<AtomicBool>,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl Scanner {
    /// Create a filesystem scanner with the default configuration.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            reader: FsReader,
            logger: TracingLogger,
            config: ScanConfig::default(),
            ignore: GlobSet::empty(),
            interrupted: Arc::new(AtomicBool::new(false)),
            progress_tx,
        }
    }

    /// Create a filesystem scanner with a custom configuration.
    pub fn with_config(config: ScanConfig) -> Result<Self, ScanError> {
        Self::with_parts(FsReader, TracingLogger, config)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DirectoryReader, L: ScanLogger> Scanner<R, L> {
    /// Create a scanner from its reader, logger and configuration.
    pub fn with_parts(reader: R, logger: L, config: ScanConfig) -> Result<Self, ScanError> {
        if config.concurrency == 0 {
            return Err(ScanError::invalid_config("concurrency must be at least 1"));
        }
        let ignore = compile_ignore(&config.ignore_patterns)?;
        let (progress_tx, _) = broadcast::channel(100);
        Ok(Self {
            reader,
            logger,
            config,
            ignore,
            interrupted: Arc::new(AtomicBool::new(false)),
            progress_tx,
        })
    }

    /// The configuration this scanner was built with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Flag that stops scans when set.
    ///
    /// Directories not yet listed are skipped and the running scan returns
    /// [`ScanError::Interrupted`]. Scans started while the flag is set fail
    /// immediately; store `false` to re-arm the scanner.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Scan `path` and return the filtered tree.
    ///
    /// Returns `Ok(None)` when the root directory itself is rejected by
    /// `filter`.
    pub fn scan<F>(&self, path: impl AsRef<Path>, filter: F) -> Result<Option<DirectoryEntry>, ScanError>
    where
        F: Fn(&DirectoryEntry) -> bool + Sync,
    {
        self.scan_report(path, filter).map(|report| report.root)
    }

    /// Scan `path`, also returning timing and the warnings for every
    /// subtree or file that could not be read.
    pub fn scan_report<F>(&self, path: impl AsRef<Path>, filter: F) -> Result<ScanReport, ScanError>
    where
        F: Fn(&DirectoryEntry) -> bool + Sync,
    {
        let start = Instant::now();
        let root_path = absolute(path.as_ref())?;

        self.logger.info(
            "scan started",
            &[
                ("path", &root_path.display()),
                ("concurrency", &self.config.concurrency),
            ],
        );

        let ctx = ScanContext {
            filter: &filter,
            gate: AdmissionGate::new(self.config.concurrency),
            progress: ProgressTracker::new(),
            warnings: Mutex::new(Vec::new()),
        };

        let outcome = self.in_pool(|| {
            let listing = {
                let _permit = ctx.gate.acquire();
                self.list(&root_path)
            };
            match listing {
                Ok(listing) => Ok(self.build(&ctx, &root_path, listing, 0)),
                Err(ScanError::Interrupted) => Err(ScanError::Interrupted),
                Err(err) => {
                    self.logger.error(
                        "cannot list scan root",
                        &[("path", &root_path.display()), ("error", &err)],
                    );
                    Err(err)
                }
            }
        })??;

        if self.interrupted.load(Ordering::Relaxed) {
            self.logger.info("scan interrupted", &[("path", &root_path.display())]);
            return Err(ScanError::Interrupted);
        }

        let root = match outcome {
            Scanned::Kept(dir) => Some(dir),
            Scanned::Rejected(_) => {
                self.logger.debug("scan root rejected by filter", &[("path", &root_path.display())]);
                None
            }
        };

        let snapshot = ctx.progress.snapshot(&root_path);
        let _ = self.progress_tx.send(snapshot.clone());

        let mut warnings = ctx.warnings.into_inner().unwrap_or_else(PoisonError::into_inner);
        warnings.sort_by(|a, b| a.path.cmp(&b.path));

        self.logger.info(
            "scan finished",
            &[
                ("path", &root_path.display()),
                ("dirs", &snapshot.dirs_scanned),
                ("files", &snapshot.files_scanned),
                ("bytes", &snapshot.bytes_scanned),
                ("warnings", &warnings.len()),
                ("peak_reads", &ctx.gate.peak()),
                ("elapsed_ms", &snapshot.elapsed.as_millis()),
            ],
        );

        Ok(ScanReport::new(root, root_path, start.elapsed(), warnings))
    }

    /// List only the immediate files of `path`, without recursing.
    pub fn list_files(&self, path: impl AsRef<Path>) -> Result<Vec<FileEntry>, ScanError> {
        let path = absolute(path.as_ref())?;
        let listing = self.list(&path)?;
        Ok(self.partition(&path, listing).files)
    }

    /// Run `f` on a scan thread pool sized by `config.threads`.
    fn in_pool<T, F>(&self, f: F) -> Result<T, ScanError>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .stack_size(SCAN_STACK_SIZE)
            .thread_name(|i| format!("sizewalk-scan-{i}"))
            .build()
            .map_err(|e| ScanError::invalid_config(format!("thread pool: {e}")))?;
        Ok(pool.install(f))
    }

    /// Deepest level whose directories are still listed.
    fn depth_limit(&self) -> u32 {
        self.config
            .max_depth
            .map_or(MAX_SCAN_DEPTH, |depth| depth.min(MAX_SCAN_DEPTH))
    }

    /// Read the entries of one directory.
    fn list(&self, path: &Path) -> Result<Vec<RawEntry>, ScanError> {
        if self.interrupted.load(Ordering::Relaxed) {
            return Err(ScanError::Interrupted);
        }
        self.reader
            .read_entries(path)
            .map_err(|e| ScanError::io(path, e))
    }

    /// Build the node for an already-listed directory at `depth`, recursing
    /// into its subdirectories and applying the filter last.
    fn build<F>(
        &self,
        ctx: &ScanContext<'_, F>,
        path: &Path,
        listing: Vec<RawEntry>,
        depth: u32,
    ) -> Scanned
    where
        F: Fn(&DirectoryEntry) -> bool + Sync,
    {
        let Partition {
            files,
            subdirs,
            bytes,
            unreadable,
        } = self.partition(path, listing);

        ctx.progress.record_dir(path, &self.progress_tx);
        ctx.progress.record_files(files.len() as u64, bytes);
        for file in unreadable {
            ctx.warn(ScanWarning::metadata_error(file));
        }

        let limit = self.depth_limit();
        let outcomes = if depth >= limit {
            for subdir in &subdirs {
                let err = ScanError::DepthLimit {
                    path: subdir.clone(),
                    limit,
                };
                self.skip_subtree(ctx, subdir, &err);
            }
            Vec::new()
        } else {
            FanOut::new(&ctx.gate).run(
                &subdirs,
                |subdir| self.list(subdir),
                |subdir, listing| match listing {
                    Ok(listing) => Some(self.build(ctx, subdir, listing, depth + 1)),
                    Err(err) => {
                        self.skip_subtree(ctx, subdir, &err);
                        None
                    }
                },
            )
        };

        let mut children = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Scanned::Kept(dir) => children.push(dir),
                Scanned::Rejected(promoted) => children.extend(promoted),
            }
        }

        let dir = DirectoryEntry::new(path, files, children);
        if (ctx.filter)(&dir) {
            return Scanned::Kept(dir);
        }

        match self.config.filter_policy {
            FilterPolicy::Discard => Scanned::Rejected(Vec::new()),
            FilterPolicy::Promote => Scanned::Rejected(dir.into_children()),
        }
    }

    /// Split a listing into files and subdirectory paths, skipping
    /// excluded names.
    fn partition(&self, path: &Path, listing: Vec<RawEntry>) -> Partition {
        let mut part = Partition::default();

        for entry in listing {
            let name = entry.name.to_string_lossy();
            if self.is_excluded(&name) {
                continue;
            }

            let full_path = path.join(&entry.name);
            if entry.is_dir {
                part.subdirs.push(full_path);
                continue;
            }

            let size = entry.size.unwrap_or_else(|| {
                self.logger.warn(
                    "file metadata unavailable, counting 0 bytes",
                    &[("path", &full_path.display())],
                );
                part.unreadable.push(full_path.clone());
                0
            });
            part.bytes += size;
            part.files.push(FileEntry::new(&*name, full_path, size));
        }

        part
    }

    fn skip_subtree<F>(&self, ctx: &ScanContext<'_, F>, path: &Path, err: &ScanError) {
        if matches!(err, ScanError::Interrupted) {
            return;
        }
        self.logger.debug(
            "skipping subtree",
            &[("path", &path.display()), ("error", err)],
        );
        ctx.warn(err.to_warning());
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.config.should_skip_hidden(name) || self.ignore.is_match(name)
    }
}

/// State shared by every task of one scan.
struct ScanContext<'f, F> {
    filter: &'f F,
    gate: AdmissionGate,
    progress: ProgressTracker,
    warnings: Mutex<Vec<ScanWarning>>,
}

impl<F> ScanContext<'_, F> {
    fn warn(&self, warning: ScanWarning) {
        self.progress.record_error();
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }
}

/// Outcome of scanning one directory.
enum Scanned {
    Kept(DirectoryEntry),
    /// Rejected by the filter; carries children to promote, if any.
    Rejected(Vec<DirectoryEntry>),
}

#[derive(Default)]
struct Partition {
    files: Vec<FileEntry>,
    subdirs: Vec<PathBuf>,
    bytes: u64,
    unreadable: Vec<PathBuf>,
}

fn absolute(path: &Path) -> Result<PathBuf, ScanError> {
    std::path::absolute(path).map_err(|e| ScanError::io(path, e))
}

fn compile_ignore(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            ScanError::invalid_config(format!("invalid ignore pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ScanError::invalid_config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sizewalk_core::{ONE_GB, WarningKind, accept_all, flatten, flatten_by_size, size_filter};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    fn find<'a>(root: &'a DirectoryEntry, name: &str) -> Option<&'a DirectoryEntry> {
        flatten(root).into_iter().find(|d| d.name() == name)
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let tree = Scanner::new().scan(temp.path(), accept_all()).unwrap().unwrap();

        assert_eq!(tree.size(), 5 + 17 + 4 + 17);
        assert_eq!(tree.file_count(), 4);
        assert_eq!(tree.dir_count(), 3);
        assert_eq!(find(&tree, "dir1").unwrap().size(), 21);
        assert_eq!(find(&tree, "subdir").unwrap().size(), 4);
        assert!(tree.path().is_absolute());
    }

    #[test]
    fn test_nested_directories_counted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub1/sub2/sub3")).unwrap();
        fs::create_dir_all(temp.path().join("sub1/sub4")).unwrap();

        let tree = Scanner::new().scan(temp.path(), accept_all()).unwrap().unwrap();
        assert_eq!(flatten_by_size(&tree).len(), 5);
    }

    #[test]
    fn test_more_siblings_than_concurrency() {
        let temp = TempDir::new().unwrap();
        for i in 1..=15 {
            let dir = temp.path().join(format!("dir{i}"));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("file.txt"), "content").unwrap();
        }

        let tree = Scanner::new().scan(temp.path(), accept_all()).unwrap().unwrap();
        assert_eq!(flatten_by_size(&tree).len(), 16);
        assert_eq!(tree.size(), 15 * 7);
    }

    #[test]
    fn test_large_directory_filter() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("large")).unwrap();
        fs::create_dir(temp.path().join("small")).unwrap();
        // Sparse file: reports 2 GiB without using the disk space
        fs::File::create(temp.path().join("large/file.bin"))
            .unwrap()
            .set_len(2 * ONE_GB)
            .unwrap();

        let tree = Scanner::new()
            .scan(temp.path(), size_filter(ONE_GB))
            .unwrap()
            .unwrap();

        let names: Vec<_> = flatten_by_size(&tree).iter().map(|d| d.name().to_string()).collect();
        // The root passes only because its own total is 2 GiB too
        assert_eq!(names.len(), 2);
        assert_eq!(names[1], "large");
        assert!(find(&tree, "small").is_none());
    }

    #[test]
    fn test_nonexistent_root() {
        let temp = TempDir::new().unwrap();
        let err = Scanner::new()
            .scan(temp.path().join("nonexistent"), accept_all())
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_root_is_a_file() {
        let temp = create_test_tree();
        let err = Scanner::new()
            .scan(temp.path().join("file1.txt"), accept_all())
            .unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let temp = create_test_tree();
        let restricted = temp.path().join("restricted");
        fs::create_dir(&restricted).unwrap();
        fs::write(restricted.join("secret"), "xxxxxxxxxx").unwrap();
        fs::set_permissions(&restricted, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits
        let enforced = fs::read_dir(&restricted).is_err();
        let report = Scanner::new().scan_report(temp.path(), accept_all());
        fs::set_permissions(&restricted, fs::Permissions::from_mode(0o755)).unwrap();
        if !enforced {
            return;
        }

        let report = report.unwrap();
        let tree = report.root.as_ref().unwrap();
        assert!(find(tree, "restricted").is_none());
        assert_eq!(tree.size(), 5 + 17 + 4 + 17);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::PermissionDenied);
        assert!(report.is_partial());
    }

    #[test]
    fn test_ignore_patterns_and_hidden() {
        let temp = create_test_tree();
        fs::create_dir(temp.path().join(".cache")).unwrap();
        fs::write(temp.path().join(".cache/blob"), "0123456789").unwrap();
        fs::write(temp.path().join("debug.log"), "0123456789").unwrap();

        let config = ScanConfig::builder()
            .include_hidden(false)
            .ignore_patterns(vec!["dir2".to_string(), "*.log".to_string()])
            .build()
            .unwrap();
        let tree = Scanner::with_config(config)
            .unwrap()
            .scan(temp.path(), accept_all())
            .unwrap()
            .unwrap();

        assert!(find(&tree, ".cache").is_none());
        assert!(find(&tree, "dir2").is_none());
        assert!(tree.files().iter().all(|f| f.name() != "debug.log"));
        assert_eq!(tree.size(), 5 + 17 + 4);
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let config = ScanConfig::builder()
            .ignore_patterns(vec!["[unclosed".to_string()])
            .build()
            .unwrap();
        assert!(matches!(
            Scanner::with_config(config),
            Err(ScanError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_dedicated_thread_pool() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .threads(2usize)
            .concurrency(1usize)
            .build()
            .unwrap();
        let tree = Scanner::with_config(config)
            .unwrap()
            .scan(temp.path(), accept_all())
            .unwrap()
            .unwrap();
        assert_eq!(tree.dir_count(), 3);
    }

    #[test]
    fn test_deep_directory_chain() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("x")).unwrap();
        let mut deepest = temp.path().join("y");
        fs::create_dir(&deepest).unwrap();
        for _ in 0..1500 {
            deepest.push("a");
            fs::create_dir(&deepest).unwrap();
        }
        fs::write(deepest.join("leaf.txt"), "deep").unwrap();

        let report = Scanner::new().scan_report(temp.path(), accept_all()).unwrap();
        let tree = report.root.as_ref().unwrap();
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.dir_count(), 1502);
        assert!(report.warnings.is_empty());

        // Remove bottom-up; recursive removal holds one descriptor per level
        fs::remove_file(deepest.join("leaf.txt")).unwrap();
        while deepest != temp.path() {
            fs::remove_dir(&deepest).unwrap();
            deepest.pop();
        }
    }

    #[test]
    fn test_max_depth_limits_descent() {
        let temp = create_test_tree();
        let config = ScanConfig::builder().max_depth(1u32).build().unwrap();
        let report = Scanner::with_config(config)
            .unwrap()
            .scan_report(temp.path(), accept_all())
            .unwrap();

        let tree = report.root.as_ref().unwrap();
        assert!(find(tree, "subdir").is_none());
        assert_eq!(tree.size(), 5 + 17 + 17);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::DepthLimit);
        assert!(report.warnings[0].path.ends_with("dir1/subdir"));
        assert!(report.is_partial());
    }

    #[test]
    fn test_max_depth_zero_counts_root_files_only() {
        let temp = create_test_tree();
        let config = ScanConfig::builder().max_depth(0u32).build().unwrap();
        let report = Scanner::with_config(config)
            .unwrap()
            .scan_report(temp.path(), accept_all())
            .unwrap();

        assert_eq!(report.total_size(), 5);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_list_files_is_not_recursive() {
        let temp = create_test_tree();
        let files = Scanner::new().list_files(temp.path().join("dir1")).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "file2.txt");
        assert_eq!(files[0].size(), 17);
        assert!(files[0].path().is_absolute());
    }

    #[test]
    fn test_list_files_missing_dir() {
        let temp = TempDir::new().unwrap();
        let err = Scanner::new().list_files(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_interrupted_scan() {
        let temp = create_test_tree();
        let scanner = Scanner::new();
        scanner.interrupt_handle().store(true, Ordering::Relaxed);

        let err = scanner.scan(temp.path(), accept_all()).unwrap_err();
        assert!(matches!(err, ScanError::Interrupted));

        scanner.interrupt_handle().store(false, Ordering::Relaxed);
        assert!(scanner.scan(temp.path(), accept_all()).is_ok());
    }

    #[test]
    fn test_final_progress_broadcast() {
        let temp = create_test_tree();
        let scanner = Scanner::new();
        let mut rx = scanner.subscribe();

        scanner.scan(temp.path(), accept_all()).unwrap();

        let progress = rx.try_recv().unwrap();
        assert_eq!(progress.dirs_scanned, 4);
        assert_eq!(progress.files_scanned, 4);
        assert_eq!(progress.bytes_scanned, 43);
    }
}
