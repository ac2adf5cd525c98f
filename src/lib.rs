//! quickdupe - Fast Duplicate File Finder
//!
//! Finds duplicate files by grouping them on a cheap sampled signature (size
//! plus three 32-byte windows), confirms each group with a full BLAKE3 hash,
//! and writes every redundant copy to a removal manifest. A separate step
//! moves the listed files into a quarantine directory.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use yansi::Paint;

use crate::actions::quarantine::{
    quarantine_batch, BatchQuarantineResult, MoveResult, QuarantineConfig,
    QuarantineProgressCallback,
};
use crate::cli::{Cli, Commands, QuarantineArgs, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::manifest::RemovalManifest;
use crate::progress::{render_summary, Progress};
use crate::scanner::WalkerConfig;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for fatal conditions: a missing scan root, an unreadable
/// or corrupt manifest, an unusable destination, a manifest that cannot be
/// written, or an interrupted scan (downcasts to
/// [`duplicates::FinderError::Interrupted`]).
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color {
        yansi::disable();
    }

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path),
        None => Config::load(),
    };

    match cli.command {
        Commands::Scan(ref args) => handle_scan(args, config, cli.quiet),
        Commands::Quarantine(ref args) => handle_quarantine(args, &config, cli.quiet),
    }
}

/// Apply command-line flags on top of the loaded configuration.
fn merge_scan_args(mut config: Config, args: &ScanArgs) -> Config {
    if let Some(threads) = args.io_threads {
        config.io_threads = threads;
    }
    if let Some(policy) = args.short_read_policy {
        config.short_read_policy = policy;
    }
    config.follow_symlinks |= args.follow_symlinks;
    config.skip_hidden |= args.skip_hidden;
    config
        .ignore_patterns
        .extend(args.ignore_patterns.iter().cloned());
    if let Some(ref manifest) = args.manifest {
        config.manifest_path = manifest.clone();
    }
    config
}

fn handle_scan(args: &ScanArgs, config: Config, quiet: bool) -> anyhow::Result<ExitCode> {
    let config = merge_scan_args(config, args);

    // Absolute paths keep the manifest usable from any working directory.
    let root = std::fs::canonicalize(&args.path).unwrap_or_else(|_| args.path.clone());

    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;
    let progress = Arc::new(Progress::new(quiet));

    let walker_config = WalkerConfig::new(
        config.follow_symlinks,
        config.skip_hidden,
        config.ignore_patterns.clone(),
    );
    let finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_short_read_policy(config.short_read_policy)
        .with_walker_config(walker_config)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder
        .find_duplicates(&root)
        .with_context(|| format!("Scan of {} failed", root.display()))?;

    let manifest = RemovalManifest::from_groups(root, &groups);
    manifest.save(&config.manifest_path).with_context(|| {
        format!(
            "Failed to write manifest to {}",
            config.manifest_path.display()
        )
    })?;

    if !quiet {
        for line in render_summary(&summary) {
            println!("{}", line);
        }
        println!(
            "{} {}",
            "Manifest written to".dim(),
            config.manifest_path.display()
        );
    }

    let code = if summary.has_errors() {
        ExitCode::PartialSuccess
    } else if manifest.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };
    Ok(code)
}

/// Prints each planned move the way the legacy tool did.
struct ConsoleMover {
    quiet: bool,
    dry_run: bool,
}

impl QuarantineProgressCallback for ConsoleMover {
    fn on_before_move(&self, source: &Path, destination: &Path, _index: usize, _total: usize) {
        if self.quiet {
            return;
        }
        let verb = if self.dry_run { "Would move:" } else { "Moving:" };
        println!("{} {}", verb.cyan(), source.display());
        println!("{} {}", "To:".cyan(), destination.display());
    }

    fn on_move_success(&self, _result: &MoveResult) {}

    fn on_skip_missing(&self, path: &Path) {
        log::debug!("Already gone: {}", path.display());
    }

    fn on_move_failure(&self, path: &Path, error: &str) {
        eprintln!("{} {}: {}", "Failed:".red(), path.display().yellow(), error);
    }

    fn on_complete(&self, result: &BatchQuarantineResult) {
        if !self.quiet {
            println!("{}", result.summary().green());
        }
    }
}

fn handle_quarantine(
    args: &QuarantineArgs,
    config: &Config,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let manifest_path: PathBuf = args
        .manifest
        .clone()
        .unwrap_or_else(|| config.manifest_path.clone());

    let manifest = RemovalManifest::load(&manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    log::info!(
        "Quarantining {} file(s) from {} into {}",
        manifest.len(),
        manifest_path.display(),
        args.destination.display()
    );

    let mover = ConsoleMover {
        quiet,
        dry_run: args.dry_run,
    };
    let quarantine_config = QuarantineConfig::default().with_dry_run(args.dry_run);
    let result = quarantine_batch(
        &manifest.paths,
        &args.destination,
        &quarantine_config,
        Some(&mover),
    )
    .with_context(|| {
        format!(
            "Cannot use {} as quarantine directory",
            args.destination.display()
        )
    })?;

    // Per-file failures are reported by the callback and the summary only.
    if !result.all_succeeded() {
        log::warn!(
            "{} file(s) could not be quarantined",
            result.failure_count()
        );
    }
    Ok(ExitCode::Success)
}
