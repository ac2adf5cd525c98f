//! Signature index: paths grouped by quick signature.
//!
//! # Overview
//!
//! The [`SignatureIndex`] is filled in a single pass over the traversal
//! stream. Within each group, paths keep the exact order in which they were
//! inserted; that order decides which copy is kept (the first) and which are
//! removable (the rest). Groups themselves are iterated in the order their
//! signature was first seen, which keeps the removal manifest deterministic
//! for a fixed traversal order.
//!
//! # Example
//!
//! ```
//! use quickdupe::duplicates::SignatureIndex;
//! use quickdupe::scanner::QuickSignature;
//! use std::path::PathBuf;
//!
//! let sig = QuickSignature::from_sample(1000, &[0u8; 96]);
//! let mut index = SignatureIndex::new();
//! index.insert(PathBuf::from("/b.bin"), sig.clone(), 1000);
//! index.insert(PathBuf::from("/c.bin"), sig, 1000);
//!
//! assert_eq!(index.file_count(), 2);
//! assert_eq!(index.unique_count(), 1);
//! assert_eq!(index.candidate_groups().count(), 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::QuickSignature;

/// Files sharing one quick signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureGroup {
    /// The shared signature
    pub signature: QuickSignature,
    /// Recorded size shared by every member
    pub size: u64,
    /// Members in discovery order
    pub paths: Vec<PathBuf>,
}

impl SignatureGroup {
    fn new(signature: QuickSignature, size: u64) -> Self {
        Self {
            signature,
            size,
            paths: Vec::new(),
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Check if the group needs verification (2+ members).
    #[must_use]
    pub fn is_candidate(&self) -> bool {
        self.paths.len() > 1
    }

    /// The member that is kept if the group is confirmed.
    #[must_use]
    pub fn first(&self) -> Option<&PathBuf> {
        self.paths.first()
    }
}

/// Owned mapping from quick signature to the paths that produced it.
#[derive(Debug, Clone, Default)]
pub struct SignatureIndex {
    /// Groups in first-seen order
    groups: Vec<SignatureGroup>,
    /// Signature to position in `groups`
    positions: HashMap<QuickSignature, usize>,
    /// Total number of inserted paths
    files: usize,
}

impl SignatureIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` under `signature`.
    ///
    /// Identical paths are not deduplicated; traversal is expected to yield
    /// each path once.
    pub fn insert(&mut self, path: PathBuf, signature: QuickSignature, size: u64) {
        self.files += 1;

        if let Some(&pos) = self.positions.get(&signature) {
            let group = &mut self.groups[pos];
            debug_assert_eq!(
                group.size, size,
                "Signature {} recorded with sizes {} and {}",
                signature, group.size, size
            );
            group.paths.push(path);
            return;
        }

        let mut group = SignatureGroup::new(signature.clone(), size);
        group.paths.push(path);
        self.positions.insert(signature, self.groups.len());
        self.groups.push(group);
    }

    /// Total number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Number of distinct signatures.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.groups.len()
    }

    /// Files that share a signature with an earlier file.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files - self.groups.len()
    }

    /// Check if nothing has been indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files == 0
    }

    /// Look up the group for a signature.
    #[must_use]
    pub fn get(&self, signature: &QuickSignature) -> Option<&SignatureGroup> {
        self.positions.get(signature).map(|&pos| &self.groups[pos])
    }

    /// All groups in first-seen order.
    pub fn groups(&self) -> impl Iterator<Item = &SignatureGroup> {
        self.groups.iter()
    }

    /// Groups with 2+ members, in first-seen order.
    pub fn candidate_groups(&self) -> impl Iterator<Item = &SignatureGroup> {
        self.groups.iter().filter(|g| g.is_candidate())
    }

    /// Consume the index, yielding the groups with 2+ members in first-seen order.
    #[must_use]
    pub fn into_candidate_groups(self) -> Vec<SignatureGroup> {
        self.groups
            .into_iter()
            .filter(SignatureGroup::is_candidate)
            .collect()
    }
}
