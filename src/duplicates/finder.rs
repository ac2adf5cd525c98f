//! Duplicate finder implementation with two-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Signature pass**: each traversed file is sampled into a quick
//!    signature (see [`crate::scanner::signature`]) and recorded in a
//!    [`SignatureIndex`]. Files below the minimum size are skipped.
//! 2. **Verification**: every signature shared by 2+ files is confirmed or
//!    rejected by full-content hashing (see [`crate::duplicates::verify`]).
//!
//! The signature pass is single-threaded and holds one sample buffer at a
//! time; hashing within a group is the only concurrent step.
//!
//! # Example
//!
//! ```no_run
//! use quickdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
//!
//! println!("Found {} confirmed groups", summary.confirmed_groups);
//! println!("Duplicates to remove: {}", summary.removable_count);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::index::SignatureIndex;
use super::verify::{GroupVerification, GroupVerifier, Verification};
use crate::progress::{ProgressCallback, ScanEvent, PHASE_VERIFY, PHASE_WALKING};
use crate::scanner::{
    compute_signature, FileEntry, Hasher, ScanError, ShortReadPolicy, SignatureOutcome, Walker,
    WalkerConfig,
};

/// Per-file message for a duplicate whose path the manifest cannot record.
const UNLISTABLE_PATH: &str = "path is not valid UTF-8; duplicate group kept";

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for hashing within one group.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// What to do when a sampled window is short.
    pub short_read_policy: ShortReadPolicy,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("short_read_policy", &self.short_read_policy)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            short_read_policy: ShortReadPolicy::default(),
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of I/O threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the short read policy.
    #[must_use]
    pub fn with_short_read_policy(mut self, policy: ShortReadPolicy) -> Self {
        self.short_read_policy = policy;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Files that received a signature (too-small and failed files excluded)
    pub file_count: usize,
    /// Number of distinct quick signatures
    pub unique_signatures: usize,
    /// Files sharing a signature with an earlier file
    pub duplicate_count: usize,
    /// Files confirmed safe to remove
    pub removable_count: usize,
    /// Files skipped for being below the minimum size
    pub skipped_too_small: usize,
    /// Files sampled from a zero-padded short read
    pub read_warnings: usize,
    /// Groups with 2+ members that went to verification
    pub candidate_groups: usize,
    /// Groups confirmed as duplicate sets
    pub confirmed_groups: usize,
    /// Groups whose full hashes differ
    pub collision_groups: usize,
    /// Groups with a member that could not be hashed
    pub unverified_groups: usize,
    /// Confirmed groups kept because a path cannot be written to the manifest
    pub unlisted_groups: usize,
    /// Bytes that removing the duplicates would free
    pub reclaimable_space: u64,
    /// Per-file failures (path, message)
    pub file_errors: Vec<(PathBuf, String)>,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Files left after removing the duplicates.
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.file_count - self.removable_count
    }

    /// Check if any file failed to scan, sample or hash.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.file_errors.is_empty()
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    fn record_error(&mut self, path: &Path, message: String) {
        self.file_errors.push((path.to_path_buf(), message));
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Duplicate finder that orchestrates the signature and verification phases.
pub struct DuplicateFinder {
    config: FinderConfig,
    verifier: GroupVerifier,
}

impl std::fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .field("verifier", &self.verifier)
            .finish()
    }
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }

        let mut verifier = GroupVerifier::new(Arc::new(hasher), config.io_threads);
        if let Some(ref flag) = config.shutdown_flag {
            verifier = verifier.with_shutdown_flag(flag.clone());
        }

        Self { config, verifier }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    fn report(&self, event: ScanEvent) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_event(&event);
        }
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the path does not exist, is not a directory,
    /// or the scan is interrupted by a shutdown signal.
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<GroupVerification>, ScanSummary), FinderError> {
        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        log::info!("Starting duplicate scan of {}", path.display());

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        self.find_duplicates_from_entries(walker.walk())
    }

    /// Find duplicates from a pre-collected list of files.
    ///
    /// The order of `files` is the discovery order: the first file of each
    /// confirmed set is kept.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown was requested.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<GroupVerification>, ScanSummary), FinderError> {
        self.find_duplicates_from_entries(files.into_iter().map(Ok))
    }

    /// Find duplicates from a lazy traversal stream.
    ///
    /// Traversal errors are recorded per file and never abort the scan.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown was requested.
    pub fn find_duplicates_from_entries<I>(
        &self,
        entries: I,
    ) -> Result<(Vec<GroupVerification>, ScanSummary), FinderError>
    where
        I: IntoIterator<Item = Result<FileEntry, ScanError>>,
    {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let index = self.build_index(entries, &mut summary)?;

        summary.file_count = index.file_count();
        summary.unique_signatures = index.unique_count();
        summary.duplicate_count = index.duplicate_count();

        log::info!(
            "Indexed {} files: {} unique signatures, {} potential duplicates",
            summary.file_count,
            summary.unique_signatures,
            summary.duplicate_count
        );

        let verified = self.verify_groups(index, &mut summary)?;

        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} confirmed groups, {} duplicates to remove, {} reclaimable, {} collisions",
            summary.confirmed_groups,
            summary.removable_count,
            summary.reclaimable_display(),
            summary.collision_groups
        );

        Ok((verified, summary))
    }

    /// Signature pass: sample every entry and index the results.
    fn build_index<I>(
        &self,
        entries: I,
        summary: &mut ScanSummary,
    ) -> Result<SignatureIndex, FinderError>
    where
        I: IntoIterator<Item = Result<FileEntry, ScanError>>,
    {
        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_WALKING, 0);
        }

        let mut index = SignatureIndex::new();
        let mut checked = 0usize;

        for result in entries {
            if self.config.is_shutdown_requested() {
                log::debug!("Signature pass: Shutdown requested");
                return Err(FinderError::Interrupted);
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("Traversal error: {}", e);
                    summary.record_error(e.path(), e.to_string());
                    self.report(ScanEvent::FileError {
                        path: e.path().to_path_buf(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            match compute_signature(&entry, self.config.short_read_policy) {
                SignatureOutcome::TooSmall => {
                    log::warn!("File too small, skipping: {}", entry.path.display());
                    summary.skipped_too_small += 1;
                    self.report(ScanEvent::SkippedTooSmall {
                        path: entry.path,
                        size: entry.size,
                    });
                    continue;
                }
                SignatureOutcome::ReadError(e) => {
                    log::warn!("Failed to sample {}: {}", entry.path.display(), e);
                    summary.record_error(&entry.path, e.to_string());
                    self.report(ScanEvent::FileError {
                        path: entry.path,
                        message: e.to_string(),
                    });
                    continue;
                }
                SignatureOutcome::Padded { signature, warning } => {
                    summary.read_warnings += 1;
                    self.report(ScanEvent::ReadWarning {
                        path: entry.path.clone(),
                        message: warning.to_string(),
                    });
                    index.insert(entry.path.clone(), signature, entry.size);
                }
                SignatureOutcome::Signature(signature) => {
                    index.insert(entry.path.clone(), signature, entry.size);
                }
            }

            checked += 1;
            if let Some(cb) = callback {
                cb.on_progress(checked, entry.path.to_string_lossy().as_ref());
            }
        }

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_WALKING);
        }

        // The walker stops quietly on shutdown, so the stream may simply have
        // ended early.
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        Ok(index)
    }

    /// Verification pass: confirm or reject every multi-member group.
    fn verify_groups(
        &self,
        index: SignatureIndex,
        summary: &mut ScanSummary,
    ) -> Result<Vec<GroupVerification>, FinderError> {
        let groups = index.into_candidate_groups();
        summary.candidate_groups = groups.len();

        if groups.is_empty() {
            log::info!("No shared signatures, nothing to verify");
            return Ok(Vec::new());
        }

        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_VERIFY, groups.len());
        }

        log::info!("Verifying {} signature groups", groups.len());

        let mut verified = Vec::with_capacity(groups.len());
        for (idx, group) in groups.into_iter().enumerate() {
            if let Some(cb) = callback {
                cb.on_progress(idx + 1, group.signature.as_str());
            }

            self.report(ScanEvent::CandidateGroup {
                signature: group.signature.clone(),
                paths: group.paths.clone(),
            });

            let result = self.verifier.verify(group)?.withhold_unlistable();

            match result.outcome {
                Verification::Confirmed { hash } => {
                    summary.confirmed_groups += 1;
                    summary.removable_count += result.removable().len();
                    summary.reclaimable_space +=
                        result.group.size * result.removable().len() as u64;
                    self.report(ScanEvent::DuplicateSetConfirmed {
                        signature: result.group.signature.clone(),
                        hash,
                        paths: result.group.paths.clone(),
                    });
                }
                Verification::CollisionOnly { .. } => {
                    summary.collision_groups += 1;
                    log::warn!(
                        "Quick signature collision: {} files share {} but differ in content",
                        result.group.len(),
                        result.group.signature
                    );
                    self.report(ScanEvent::CollisionDetected {
                        signature: result.group.signature.clone(),
                        paths: result.group.paths.clone(),
                    });
                }
                Verification::Unverified { ref errors } => {
                    summary.unverified_groups += 1;
                    for e in errors {
                        summary.record_error(e.path(), e.to_string());
                        self.report(ScanEvent::FileError {
                            path: e.path().to_path_buf(),
                            message: e.to_string(),
                        });
                    }
                    self.report(ScanEvent::GroupUnverified {
                        signature: result.group.signature.clone(),
                        failed: errors.iter().map(|e| e.path().to_path_buf()).collect(),
                    });
                }
                Verification::Unlisted { ref unlisted, .. } => {
                    summary.unlisted_groups += 1;
                    for path in unlisted {
                        log::warn!(
                            "Keeping duplicate group: path is not valid UTF-8: {}",
                            path.display()
                        );
                        summary.record_error(path, UNLISTABLE_PATH.to_string());
                        self.report(ScanEvent::FileError {
                            path: path.clone(),
                            message: UNLISTABLE_PATH.to_string(),
                        });
                    }
                }
            }

            verified.push(result);
        }

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_VERIFY);
        }

        Ok(verified)
    }
}
