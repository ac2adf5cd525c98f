//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Signature indexing (paths grouped by quick signature, insertion order kept)
//! - Group verification (full-content hashing within each candidate group)
//! - Pipeline orchestration and scan statistics

pub mod finder;
pub mod index;
pub mod verify;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use index::{SignatureGroup, SignatureIndex};
pub use verify::{GroupVerification, GroupVerifier, Verification};

use std::path::PathBuf;

/// Collect the removal list: every member after the first of each confirmed
/// group, in group order then member order.
#[must_use]
pub fn removal_list(groups: &[GroupVerification]) -> Vec<PathBuf> {
    groups
        .iter()
        .flat_map(|g| g.removable().iter().cloned())
        .collect()
}
