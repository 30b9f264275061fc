//! sizewalk - find the directories that take up your disk space.
//!
//! Usage:
//!   sizewalk folder-list [-d DIR]   Largest directories, biggest first
//!   sizewalk file-list [-d DIR]     Files directly inside a directory
//!   sizewalk --help                 Show help

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing_subscriber::EnvFilter;

use sizewalk_core::{ByteSize, DEFAULT_CONCURRENCY, FileEntry, FilterPolicy, ScanConfig, ScanReport};
use sizewalk_scan::{ScanProgress, Scanner};

#[derive(Parser)]
#[command(
    name = "sizewalk",
    version,
    about = "Find the directories that take up your disk space",
    long_about = "sizewalk scans a directory tree in parallel, totals the size of every \
                  directory and lists the ones above a size threshold, largest first."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List directories above a size threshold, largest first
    FolderList {
        /// Directory to scan (defaults to current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Only show directories larger than this (e.g. "500MB", "10GB")
        #[arg(short, long, default_value = "10GB")]
        min_size: ByteSize,

        /// Maximum number of directory reads in flight
        #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Keep large subdirectories of directories below the threshold
        #[arg(long)]
        promote: bool,

        /// Maximum directory depth to descend to
        #[arg(long)]
        max_depth: Option<u32>,

        /// Maximum number of directories to show
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the files directly inside a directory
    FileList {
        /// Directory to list (defaults to current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::FolderList {
            dir,
            min_size,
            concurrency,
            promote,
            max_depth,
            top,
            format,
        } => {
            let policy = if promote {
                FilterPolicy::Promote
            } else {
                FilterPolicy::Discard
            };
            let config = ScanConfig::builder()
                .concurrency(concurrency)
                .size_threshold(min_size.0)
                .filter_policy(policy)
                .max_depth(max_depth)
                .build()
                .context("Invalid scan configuration")?;
            run_folder_list(dir, config, top, format)?;
        }
        Command::FileList { dir, format } => {
            run_file_list(dir, format)?;
        }
    }

    Ok(())
}

/// Scan a tree and print the directories above the threshold.
fn run_folder_list(
    dir: Option<PathBuf>,
    config: ScanConfig,
    top: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let dir = resolve_dir(dir)?;
    let threshold = config.size_threshold;
    tracing::debug!(?config, "resolved scan configuration");

    let scanner = Scanner::with_config(config)?;
    let filter = scanner.config().size_filter();
    let mut progress = scanner.subscribe();

    eprintln!("Scanning {}...", dir.display());
    let report = scanner
        .scan_report(&dir, filter)
        .with_context(|| format!("Failed to list directories in {}", dir.display()))?;

    let dirs: Vec<FileEntry> = report
        .largest_dirs()
        .into_iter()
        .take(top.unwrap_or(usize::MAX))
        .map(|d| d.as_file_entry())
        .collect();

    match format {
        OutputFormat::Text => {
            let totals = last_progress(&mut progress);
            print_directories(&report, &dirs, threshold, totals.as_ref());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dirs)?),
    }

    Ok(())
}

/// List the immediate files of a directory, largest first.
fn run_file_list(dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let dir = resolve_dir(dir)?;

    let mut files = Scanner::new()
        .list_files(&dir)
        .with_context(|| format!("Failed to list files in {}", dir.display()))?;
    files.sort_by(|a, b| b.size().cmp(&a.size()));

    match format {
        OutputFormat::Text => {
            for file in &files {
                println!("{:>12}  {}", format_size(file.size()), file.name());
            }
            println!();
            println!(
                " {} files, {}",
                files.len(),
                format_size(files.iter().map(FileEntry::size).sum())
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&files)?),
    }

    Ok(())
}

/// Drain `rx`, keeping the newest snapshot (the scan's final totals).
fn last_progress(rx: &mut broadcast::Receiver<ScanProgress>) -> Option<ScanProgress> {
    let mut last = None;
    loop {
        match rx.try_recv() {
            Ok(progress) => last = Some(progress),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return last,
        }
    }
}

fn print_directories(
    report: &ScanReport,
    dirs: &[FileEntry],
    threshold: u64,
    totals: Option<&ScanProgress>,
) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        report.root_path.display(),
        format_size(report.total_size())
    );
    println!(
        " {} directories larger than {}",
        dirs.len(),
        format_size(threshold)
    );
    match totals {
        Some(totals) => println!(
            " Scanned {} items in {:.2}s ({:.0} files/s)",
            totals.total_items(),
            report.scan_duration.as_secs_f64(),
            totals.files_per_second()
        ),
        None => println!(" Scanned in {:.2}s", report.scan_duration.as_secs_f64()),
    }
    println!("{}", "─".repeat(60));
    println!();

    for dir in dirs {
        println!("Name: {}", dir.name());
        println!("Path: {}", dir.path().display());
        println!("Size: {}", format_size(dir.size()));
        println!("-----");
    }

    if report.has_warnings() {
        println!();
        println!(
            "{} warning(s) during scan (run with --verbose for details)",
            report.warnings.len()
        );
    }
}

fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sizewalk=debug,warn")
    } else {
        EnvFilter::new("sizewalk=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
