//! Quarantine: move manifest entries into a holding directory.
//!
//! # Overview
//!
//! Files listed in a removal manifest are moved, never deleted, into a
//! destination directory:
//! - Existence is re-checked immediately before each move; missing sources
//!   are skipped, so re-running with the same manifest is harmless
//! - The destination keeps the source's base name; on a clash the suffix
//!   `" copy"` is appended until the name is free (`photo.jpg copy`,
//!   `photo.jpg copy copy`, ...)
//! - Moves use `rename`, falling back to copy + sync + remove across devices
//! - A failed move is recorded and the batch continues
//!
//! # Example
//!
//! ```no_run
//! use quickdupe::actions::quarantine::{quarantine_file, resolve_destination};
//! use std::path::Path;
//!
//! let dest = resolve_destination(Path::new("/quarantine"), Path::new("/photos/photo.jpg")).unwrap();
//! println!("Would move to {}", dest.display());
//!
//! let moved = quarantine_file(Path::new("/photos/photo.jpg"), Path::new("/quarantine")).unwrap();
//! println!("Moved to {}", moved.destination.display());
//! ```

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Suffix appended to a destination name while it is taken.
pub const COLLISION_SUFFIX: &str = " copy";

/// Error type for quarantine operations.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// Source file was not found (already moved or deleted).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Source is not a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Source path has no file name component.
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    /// Permission denied when reading or moving the source.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The destination exists and is not a directory.
    #[error("destination is not a directory: {0}")]
    DestinationNotADirectory(PathBuf),

    /// The destination directory could not be created.
    #[error("failed to create destination {path}: {source}")]
    CreateDestination {
        /// Destination directory
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Moving the file failed.
    #[error("failed to move {path} to {destination}: {source}")]
    MoveFailed {
        /// Source file
        path: PathBuf,
        /// Planned destination
        destination: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl QuarantineError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::NotAFile(p)
            | Self::NoFileName(p)
            | Self::PermissionDenied(p)
            | Self::DestinationNotADirectory(p)
            | Self::CreateDestination { path: p, .. }
            | Self::MoveFailed { path: p, .. } => p,
        }
    }
}

/// A completed (or, in a dry run, planned) move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// Original location.
    pub source: PathBuf,
    /// New location inside the quarantine directory.
    pub destination: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

/// Results of a batch quarantine operation.
#[derive(Debug, Clone, Default)]
pub struct BatchQuarantineResult {
    /// Moved files.
    pub moved: Vec<MoveResult>,
    /// Sources that no longer existed.
    pub skipped_missing: Vec<PathBuf>,
    /// Failed moves with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes moved.
    pub bytes_moved: u64,
}

impl BatchQuarantineResult {
    /// Number of moved files.
    #[must_use]
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    /// Number of failed moves.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every present source was moved.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Moved {} file(s) ({})",
            self.moved_count(),
            bytesize::ByteSize::b(self.bytes_moved)
        );
        if !self.skipped_missing.is_empty() {
            summary.push_str(&format!(
                ", {} already gone",
                self.skipped_missing.len()
            ));
        }
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failure_count()));
        }
        summary
    }
}

/// Configuration for quarantine operations.
#[derive(Debug, Clone, Default)]
pub struct QuarantineConfig {
    /// Plan the moves without touching the filesystem.
    pub dry_run: bool,
}

impl QuarantineConfig {
    /// Enable/disable dry run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Callback trait for quarantine progress reporting.
pub trait QuarantineProgressCallback: Send + Sync {
    /// Called before each move, with the resolved destination.
    fn on_before_move(&self, source: &Path, destination: &Path, index: usize, total: usize);

    /// Called after a successful move.
    fn on_move_success(&self, result: &MoveResult);

    /// Called when a source no longer exists.
    fn on_skip_missing(&self, _path: &Path) {}

    /// Called after a failed move.
    fn on_move_failure(&self, path: &Path, error: &str);

    /// Called when the batch completes.
    fn on_complete(&self, result: &BatchQuarantineResult);
}

/// Append [`COLLISION_SUFFIX`] to a file name.
fn with_suffix(name: &OsString) -> OsString {
    let mut next = name.clone();
    next.push(COLLISION_SUFFIX);
    next
}

/// Check if anything, including a dangling symlink, occupies `path`.
fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Pick a free name in `dest_dir` for `name`, also avoiding `reserved`.
fn free_destination(dest_dir: &Path, name: &OsString, reserved: &HashSet<PathBuf>) -> PathBuf {
    let mut candidate_name = name.clone();
    let mut candidate = dest_dir.join(&candidate_name);
    while is_occupied(&candidate) || reserved.contains(&candidate) {
        candidate_name = with_suffix(&candidate_name);
        candidate = dest_dir.join(&candidate_name);
    }
    candidate
}

/// Resolve where `source` would land inside `dest_dir`.
///
/// The candidate is `dest_dir/<base name>`; while it exists, `" copy"` is
/// appended to the name. An existing file is never chosen.
///
/// # Errors
///
/// Returns [`QuarantineError::NoFileName`] if `source` has no base name.
///
/// # Example
///
/// ```
/// use quickdupe::actions::quarantine::resolve_destination;
/// use std::path::Path;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("photo.jpg"), b"kept").unwrap();
///
/// let dest = resolve_destination(dir.path(), Path::new("/elsewhere/photo.jpg")).unwrap();
/// assert_eq!(dest, dir.path().join("photo.jpg copy"));
/// ```
pub fn resolve_destination(dest_dir: &Path, source: &Path) -> Result<PathBuf, QuarantineError> {
    let name = source
        .file_name()
        .ok_or_else(|| QuarantineError::NoFileName(source.to_path_buf()))?;
    Ok(free_destination(dest_dir, &name.to_os_string(), &HashSet::new()))
}

/// Check if an error is a cross-device rename failure.
fn is_cross_device_error(err: &io::Error) -> bool {
    match err.raw_os_error() {
        Some(18) if cfg!(unix) => true,    // EXDEV
        Some(17) if cfg!(windows) => true, // ERROR_NOT_SAME_DEVICE
        _ => false,
    }
}

/// Move `source` to `destination`, copying across devices.
///
/// # Errors
///
/// Returns the underlying I/O error. On a failed cross-device copy the partial
/// destination is removed and the source is left in place.
pub fn relocate_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if is_cross_device_error(&err) => {
            log::debug!(
                "Cross-device move, copying {} to {}",
                source.display(),
                destination.display()
            );
            match fs::copy(source, destination) {
                Ok(_) => {
                    let file = fs::File::open(destination)?;
                    file.sync_all()?;
                    fs::remove_file(source)
                }
                Err(copy_err) => {
                    let _ = fs::remove_file(destination);
                    Err(copy_err)
                }
            }
        }
        Err(err) => Err(err),
    }
}

/// Look up the source right before acting on it.
fn check_source(source: &Path) -> Result<u64, QuarantineError> {
    let metadata = fs::symlink_metadata(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => QuarantineError::NotFound(source.to_path_buf()),
        io::ErrorKind::PermissionDenied => QuarantineError::PermissionDenied(source.to_path_buf()),
        _ => QuarantineError::MoveFailed {
            path: source.to_path_buf(),
            destination: PathBuf::new(),
            source: e,
        },
    })?;

    if !metadata.is_file() {
        return Err(QuarantineError::NotAFile(source.to_path_buf()));
    }
    Ok(metadata.len())
}

/// Make sure `dest_dir` exists as a directory, creating it if absent.
///
/// # Errors
///
/// Returns [`QuarantineError::DestinationNotADirectory`] if a non-directory
/// occupies the path, or [`QuarantineError::CreateDestination`] if creation
/// fails.
pub fn prepare_destination(dest_dir: &Path) -> Result<(), QuarantineError> {
    if dest_dir.exists() && !dest_dir.is_dir() {
        return Err(QuarantineError::DestinationNotADirectory(
            dest_dir.to_path_buf(),
        ));
    }
    fs::create_dir_all(dest_dir).map_err(|e| QuarantineError::CreateDestination {
        path: dest_dir.to_path_buf(),
        source: e,
    })
}

/// Move a single file into `dest_dir`.
///
/// # Errors
///
/// - `NotFound` if the source is gone
/// - `NotAFile` if the source is a directory or special file
/// - `MoveFailed` if the move itself fails
pub fn quarantine_file(source: &Path, dest_dir: &Path) -> Result<MoveResult, QuarantineError> {
    let size = check_source(source)?;
    let destination = resolve_destination(dest_dir, source)?;
    move_to(source, destination, size)
}

fn move_to(source: &Path, destination: PathBuf, size: u64) -> Result<MoveResult, QuarantineError> {
    relocate_file(source, &destination).map_err(|e| match e.kind() {
        // The destination directory can vanish too; only a gone source is a skip.
        io::ErrorKind::NotFound if !is_occupied(source) => {
            QuarantineError::NotFound(source.to_path_buf())
        }
        io::ErrorKind::PermissionDenied => QuarantineError::PermissionDenied(source.to_path_buf()),
        _ => QuarantineError::MoveFailed {
            path: source.to_path_buf(),
            destination: destination.clone(),
            source: e,
        },
    })?;

    log::info!("Moved {} to {}", source.display(), destination.display());

    Ok(MoveResult {
        source: source.to_path_buf(),
        destination,
        size,
    })
}

/// Quarantine every path in `paths`, in order.
///
/// Missing sources are skipped; other per-file failures are recorded and the
/// batch continues. In a dry run nothing is created or moved, but the planned
/// destinations still avoid each other.
///
/// # Errors
///
/// Returns an error only if the destination directory cannot be prepared.
pub fn quarantine_batch<C: QuarantineProgressCallback>(
    paths: &[PathBuf],
    dest_dir: &Path,
    config: &QuarantineConfig,
    callback: Option<&C>,
) -> Result<BatchQuarantineResult, QuarantineError> {
    if config.dry_run {
        if dest_dir.exists() && !dest_dir.is_dir() {
            return Err(QuarantineError::DestinationNotADirectory(
                dest_dir.to_path_buf(),
            ));
        }
    } else {
        prepare_destination(dest_dir)?;
    }

    let mut result = BatchQuarantineResult::default();
    let mut planned: HashSet<PathBuf> = HashSet::new();
    let total = paths.len();

    for (index, source) in paths.iter().enumerate() {
        let attempt = check_source(source).and_then(|size| {
            let name = source
                .file_name()
                .ok_or_else(|| QuarantineError::NoFileName(source.clone()))?;
            let destination = free_destination(dest_dir, &name.to_os_string(), &planned);

            if let Some(cb) = callback {
                cb.on_before_move(source, &destination, index, total);
            }

            if config.dry_run {
                planned.insert(destination.clone());
                Ok(MoveResult {
                    source: source.clone(),
                    destination,
                    size,
                })
            } else {
                move_to(source, destination, size)
            }
        });

        match attempt {
            Ok(moved) => {
                result.bytes_moved += moved.size;
                if let Some(cb) = callback {
                    cb.on_move_success(&moved);
                }
                result.moved.push(moved);
            }
            Err(QuarantineError::NotFound(path)) => {
                log::debug!("Skipping missing file: {}", path.display());
                if let Some(cb) = callback {
                    cb.on_skip_missing(&path);
                }
                result.skipped_missing.push(path);
            }
            Err(e) => {
                let error_msg = e.to_string();
                log::warn!("Failed to quarantine {}: {}", source.display(), error_msg);
                if let Some(cb) = callback {
                    cb.on_move_failure(source, &error_msg);
                }
                result.failures.push((source.clone(), error_msg));
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&result);
    }

    log::info!("{}", result.summary());

    Ok(result)
}
