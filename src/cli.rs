//! Command-line interface definitions for quickdupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! The CLI follows standard conventions with global options (verbosity, color) and
//! subcommands for the two steps: detecting duplicates and quarantining them.
//!
//! # Example
//!
//! ```bash
//! # Scan a directory and write duplicates-to-remove.json
//! quickdupe scan ~/Pictures
//!
//! # Write the manifest somewhere else
//! quickdupe scan ~/Pictures --manifest /tmp/pictures.json
//!
//! # Move the listed files into a holding directory
//! quickdupe quarantine ~/dupes --manifest /tmp/pictures.json
//!
//! # Verbose mode for debugging
//! quickdupe -v scan ~/Pictures
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::scanner::ShortReadPolicy;

/// Fast duplicate file finder using sampled signatures.
///
/// quickdupe groups files by size and three sampled 32-byte windows, confirms
/// each group with a full BLAKE3 hash, and writes the redundant copies to a
/// removal manifest. A separate `quarantine` step moves those files aside.
#[derive(Debug, Parser)]
#[command(name = "quickdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Use this configuration file instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for quickdupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files and write a removal manifest
    Scan(ScanArgs),
    /// Move the files listed in a removal manifest into a directory
    Quarantine(QuarantineArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Where to write the removal manifest
    ///
    /// Defaults to duplicates-to-remove.json in the working directory.
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// These patterns are added to any .gitignore patterns found.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Number of I/O threads for hashing within a group (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// How to treat a sampled window that reads short
    #[arg(long, value_enum, value_name = "POLICY")]
    pub short_read_policy: Option<ShortReadPolicy>,
}

/// Arguments for the quarantine subcommand.
#[derive(Debug, Args)]
pub struct QuarantineArgs {
    /// Directory to move the files into (created if absent)
    #[arg(value_name = "DEST")]
    pub destination: PathBuf,

    /// Removal manifest to read
    ///
    /// Defaults to duplicates-to-remove.json in the working directory.
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Show the planned moves without moving anything
    #[arg(long)]
    pub dry_run: bool,
}
