//! File actions module.
//!
//! This module provides functionality for:
//! - Quarantine: moving removal-manifest entries into a holding directory
//!
//! # Quarantine
//!
//! Files are moved, never deleted:
//! - Missing sources are skipped (re-runs are harmless)
//! - Name clashes gain a `" copy"` suffix, existing files are never overwritten
//! - Cross-device moves fall back to copy + sync + remove
//! - Batch operations with progress reporting
//!
//! ```no_run
//! use quickdupe::actions::quarantine::{quarantine_batch, QuarantineConfig, QuarantineProgressCallback};
//! use quickdupe::actions::quarantine::{BatchQuarantineResult, MoveResult};
//! use std::path::{Path, PathBuf};
//!
//! struct NoCallback;
//! impl QuarantineProgressCallback for NoCallback {
//!     fn on_before_move(&self, _: &Path, _: &Path, _: usize, _: usize) {}
//!     fn on_move_success(&self, _: &MoveResult) {}
//!     fn on_move_failure(&self, _: &Path, _: &str) {}
//!     fn on_complete(&self, _: &BatchQuarantineResult) {}
//! }
//!
//! let paths = vec![PathBuf::from("/photos/c.jpg")];
//! let result = quarantine_batch::<NoCallback>(
//!     &paths,
//!     Path::new("/quarantine"),
//!     &QuarantineConfig::default(),
//!     None,
//! )
//! .unwrap();
//! println!("{}", result.summary());
//! ```

pub mod quarantine;

// Re-export commonly used types
pub use quarantine::{
    prepare_destination, quarantine_batch, quarantine_file, relocate_file, resolve_destination,
    BatchQuarantineResult, MoveResult, QuarantineConfig, QuarantineError,
    QuarantineProgressCallback, COLLISION_SUFFIX,
};
