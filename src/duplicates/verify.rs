//! Full-content verification of signature groups.
//!
//! # Overview
//!
//! A shared quick signature only says that size and three sampled windows
//! agree. The [`GroupVerifier`] hashes every member of a group with BLAKE3
//! and decides:
//!
//! - all hashes equal: [`Verification::Confirmed`], every member after the
//!   first is removable;
//! - hashes differ: [`Verification::CollisionOnly`], nothing is removable;
//! - a member could not be read: [`Verification::Unverified`], nothing is
//!   removable.
//!
//! A confirmed group whose removable members cannot all be written to the
//! JSON manifest (non-UTF-8 paths) is demoted to [`Verification::Unlisted`]
//! by [`GroupVerification::withhold_unlistable`].
//!
//! Hashes within one group are computed concurrently on a bounded rayon pool
//! and joined before the decision. Groups are verified one after another.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::finder::FinderError;
use super::index::SignatureGroup;
use crate::scanner::{Hash, HashError, Hasher};

/// Outcome of verifying one group.
#[derive(Debug, Clone)]
pub enum Verification {
    /// All members hashed identically.
    Confirmed {
        /// The shared full-content hash
        hash: Hash,
    },
    /// Members differ despite sharing a quick signature.
    CollisionOnly {
        /// Per-member hashes, in member order
        hashes: Vec<Hash>,
    },
    /// At least one member could not be hashed.
    Unverified {
        /// The failures, one per unreadable member
        errors: Vec<HashError>,
    },
    /// All members hashed identically, but some removable members have paths
    /// the manifest cannot represent.
    Unlisted {
        /// The shared full-content hash
        hash: Hash,
        /// Members whose paths are not valid UTF-8
        unlisted: Vec<PathBuf>,
    },
}

/// A signature group together with its verification outcome.
#[derive(Debug, Clone)]
pub struct GroupVerification {
    /// The verified group
    pub group: SignatureGroup,
    /// What verification decided
    pub outcome: Verification,
}

impl GroupVerification {
    /// Check if the group is a confirmed duplicate set.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self.outcome, Verification::Confirmed { .. })
    }

    /// Members that are safe to remove: all but the first of a confirmed set.
    #[must_use]
    pub fn removable(&self) -> &[PathBuf] {
        match self.outcome {
            Verification::Confirmed { .. } => self.group.paths.get(1..).unwrap_or(&[]),
            Verification::CollisionOnly { .. }
            | Verification::Unverified { .. }
            | Verification::Unlisted { .. } => &[],
        }
    }

    /// Demote a confirmed group to [`Verification::Unlisted`] if any removable
    /// member has a path that is not valid UTF-8. The whole group is kept.
    #[must_use]
    pub fn withhold_unlistable(self) -> Self {
        let Verification::Confirmed { hash } = self.outcome else {
            return self;
        };
        let unlisted: Vec<PathBuf> = self
            .removable()
            .iter()
            .filter(|p| p.to_str().is_none())
            .cloned()
            .collect();
        let outcome = if unlisted.is_empty() {
            Verification::Confirmed { hash }
        } else {
            Verification::Unlisted { hash, unlisted }
        };
        Self {
            group: self.group,
            outcome,
        }
    }

    /// The member that is kept.
    #[must_use]
    pub fn kept(&self) -> Option<&PathBuf> {
        self.group.first()
    }
}

/// Verifies signature groups by hashing their members.
pub struct GroupVerifier {
    hasher: Arc<Hasher>,
    pool: Option<rayon::ThreadPool>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for GroupVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupVerifier")
            .field("hasher", &self.hasher)
            .field("pool", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .field("shutdown_flag", &self.shutdown_flag)
            .finish()
    }
}

impl GroupVerifier {
    /// Create a verifier hashing with up to `io_threads` concurrent reads.
    #[must_use]
    pub fn new(hasher: Arc<Hasher>, io_threads: usize) -> Self {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(io_threads.max(1))
            .thread_name(|i| format!("quickdupe-hash-{}", i))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!(
                    "Failed to create hashing thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                None
            }
        };

        Self {
            hasher,
            pool,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash every member of `group` and classify the group.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown was requested before or
    /// during hashing. Per-file read failures are not errors; they make the
    /// group [`Verification::Unverified`].
    pub fn verify(&self, group: SignatureGroup) -> Result<GroupVerification, FinderError> {
        if self.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let results = self.hash_members(&group.paths);

        let mut hashes = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(hash) => hashes.push(hash),
                Err(HashError::Interrupted(_)) => return Err(FinderError::Interrupted),
                Err(e) => {
                    log::debug!("Failed to hash {}: {}", e.path().display(), e);
                    errors.push(e);
                }
            }
        }

        let outcome = if !errors.is_empty() {
            Verification::Unverified { errors }
        } else if hashes.windows(2).all(|w| w[0] == w[1]) {
            match hashes.first().copied() {
                Some(hash) => Verification::Confirmed { hash },
                None => Verification::CollisionOnly { hashes },
            }
        } else {
            Verification::CollisionOnly { hashes }
        };

        log::debug!(
            "Group {} ({} members): {}",
            group.signature,
            group.len(),
            match outcome {
                Verification::Confirmed { .. } => "confirmed",
                Verification::CollisionOnly { .. } => "collision",
                Verification::Unverified { .. } => "unverified",
                Verification::Unlisted { .. } => "unlisted",
            }
        );

        Ok(GroupVerification { group, outcome })
    }

    /// Hash members concurrently; results keep member order.
    fn hash_members(&self, paths: &[PathBuf]) -> Vec<Result<Hash, HashError>> {
        let hash_all = || {
            paths
                .par_iter()
                .map(|path| self.hasher.full_hash(path))
                .collect::<Vec<_>>()
        };

        match self.pool {
            Some(ref pool) => pool.install(hash_all),
            None => hash_all(),
        }
    }
}
