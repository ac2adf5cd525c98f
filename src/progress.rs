//! Progress reporting and scan diagnostics.
//!
//! The duplicate finder reports through the write-only [`ProgressCallback`]
//! sink: phase progress (walking, verification) plus [`ScanEvent`]s for
//! skipped files, read warnings, per-file errors and per-group decisions.
//!
//! [`Progress`] is the terminal implementation: indicatif bars on stderr and
//! coloured diagnostics on stdout.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use yansi::Paint;

use crate::duplicates::ScanSummary;
use crate::scanner::{hash_to_hex, Hash, QuickSignature, MIN_SIGNATURE_SIZE};

/// Phase name used while walking and sampling files.
pub const PHASE_WALKING: &str = "walking";
/// Phase name used while verifying signature groups.
pub const PHASE_VERIFY: &str = "verify";

/// A diagnostic event raised during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A file was below the minimum signature size and was excluded.
    SkippedTooSmall {
        /// Excluded file
        path: PathBuf,
        /// Recorded size
        size: u64,
    },
    /// A file was sampled from a short read and zero-padded.
    ReadWarning {
        /// File with the short read
        path: PathBuf,
        /// Human-readable detail
        message: String,
    },
    /// A file could not be processed and was left out.
    FileError {
        /// File that failed
        path: PathBuf,
        /// Human-readable detail
        message: String,
    },
    /// Several files share a quick signature and are about to be verified.
    CandidateGroup {
        /// The shared signature
        signature: QuickSignature,
        /// Members in discovery order
        paths: Vec<PathBuf>,
    },
    /// Every member of a group hashed identically.
    DuplicateSetConfirmed {
        /// The shared signature
        signature: QuickSignature,
        /// The shared full-content hash
        hash: Hash,
        /// Members in discovery order
        paths: Vec<PathBuf>,
    },
    /// Quick signatures matched but full hashes differ.
    CollisionDetected {
        /// The shared signature
        signature: QuickSignature,
        /// Members in discovery order
        paths: Vec<PathBuf>,
    },
    /// A group could not be fully hashed; nothing in it is removable.
    GroupUnverified {
        /// The shared signature
        signature: QuickSignature,
        /// Members that failed to hash
        failed: Vec<PathBuf>,
    },
}

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates and diagnostics during
/// the duplicate detection pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_WALKING`], [`PHASE_VERIFY`])
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called for every diagnostic event.
    fn on_event(&self, _event: &ScanEvent) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    verify: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars or informational events are shown.
    ///
    /// # Examples
    ///
    /// ```
    /// use quickdupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            verify: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files checked")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn verify_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} groups ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    /// Print a line on stdout without tearing the active bars.
    fn print_line(&self, line: String) {
        self.multi.suspend(|| println!("{}", line));
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            PHASE_WALKING => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                *self.walking.lock().unwrap() = Some(pb);
            }
            PHASE_VERIFY => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::verify_style());
                pb.set_message("Verifying");
                *self.verify.lock().unwrap() = Some(pb);
            }
            _ => {}
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let display_msg = truncate_path(path, 30);
        if let Some(ref pb) = *self.verify.lock().unwrap() {
            pb.set_position(current as u64);
            pb.set_message(display_msg);
        } else if let Some(ref pb) = *self.walking.lock().unwrap() {
            pb.set_position(current as u64);
            pb.set_message(display_msg);
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        match phase {
            PHASE_WALKING => {
                if let Some(pb) = self.walking.lock().unwrap().take() {
                    pb.finish_with_message("Walking complete");
                }
            }
            PHASE_VERIFY => {
                if let Some(pb) = self.verify.lock().unwrap().take() {
                    pb.finish_with_message("Verification complete");
                }
            }
            _ => {}
        }
    }

    fn on_event(&self, event: &ScanEvent) {
        if let ScanEvent::FileError { path, message } = event {
            // Errors are shown even in quiet mode.
            self.multi.suspend(|| {
                eprintln!(
                    "{} {}: {}",
                    "Failed:".red(),
                    path.display().yellow(),
                    message
                );
            });
            return;
        }

        if self.quiet {
            return;
        }

        for line in render_event(event) {
            self.print_line(line);
        }
    }
}

/// Render an event as the lines shown on the console.
#[must_use]
pub fn render_event(event: &ScanEvent) -> Vec<String> {
    match event {
        ScanEvent::SkippedTooSmall { path, size } => vec![format!(
            "{} {} ({} bytes)",
            "File too small, skipping:".yellow(),
            path.display(),
            size
        )],
        ScanEvent::ReadWarning { path, message } => vec![format!(
            "{} {}: {}",
            "Short read, sample padded:".yellow(),
            path.display().yellow(),
            message
        )],
        ScanEvent::FileError { path, message } => vec![format!(
            "{} {}: {}",
            "Failed:".red(),
            path.display().yellow(),
            message
        )],
        ScanEvent::CandidateGroup { signature, paths } => {
            let mut lines = vec![
                "These files are very likely the same:".red().to_string(),
                format!("{} {}", "Signature:".dim(), signature.cyan()),
            ];
            lines.extend(
                paths
                    .iter()
                    .map(|p| format!("\t{}", p.display().yellow())),
            );
            lines
        }
        ScanEvent::DuplicateSetConfirmed { hash, .. } => vec![
            format!(
                "{} {}",
                "All files hashes are the same:".green(),
                hash_to_hex(hash).green()
            ),
            "Marking duplicates as safe to remove".green().to_string(),
        ],
        ScanEvent::CollisionDetected { paths, .. } => vec![format!(
            "{} {} files share a signature but differ in content; keeping all",
            "Signature collision:".magenta(),
            paths.len()
        )],
        ScanEvent::GroupUnverified { failed, .. } => vec![format!(
            "{} {} file(s) could not be hashed; keeping the whole group",
            "Unverified group:".magenta(),
            failed.len()
        )],
    }
}

/// Render the end-of-scan summary.
///
/// The first five lines keep the wording of the original detector output.
#[must_use]
pub fn render_summary(summary: &ScanSummary) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", "File Count:".bold(), summary.file_count),
        format!("{} {}", "Unique items:".bold(), summary.unique_signatures),
        format!("{} {}", "Duplicates:".bold(), summary.duplicate_count),
        format!(
            "{} {}",
            "Duplicates to remove:".bold(),
            summary.removable_count.green()
        ),
        format!(
            "{} {}",
            "File Count - Removed:".bold(),
            summary.remaining_count()
        ),
    ];

    if summary.skipped_too_small > 0 {
        lines.push(format!(
            "{} {}",
            format!("Skipped (under {} bytes):", MIN_SIGNATURE_SIZE).dim(),
            summary.skipped_too_small
        ));
    }
    if summary.collision_groups > 0 {
        lines.push(format!(
            "{} {}",
            "Signature collisions:".magenta(),
            summary.collision_groups
        ));
    }
    if summary.unverified_groups > 0 {
        lines.push(format!(
            "{} {}",
            "Unverified groups:".magenta(),
            summary.unverified_groups
        ));
    }
    if summary.unlisted_groups > 0 {
        lines.push(format!(
            "{} {}",
            "Kept (unlistable paths):".magenta(),
            summary.unlisted_groups
        ));
    }
    if summary.has_errors() {
        lines.push(format!(
            "{} {}",
            "Files with errors:".red(),
            summary.file_errors.len()
        ));
    }
    lines.push(format!(
        "{} {} in {:.2?}",
        "Reclaimable:".dim(),
        summary.reclaimable_display(),
        summary.scan_duration
    ));
    lines
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.chars().count() >= max_len {
        let tail: String = file_name
            .chars()
            .rev()
            .take(max_len - 3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
