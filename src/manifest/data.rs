//! Data structures for removal manifests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::duplicates::{removal_list, GroupVerification};

/// Current version of the manifest file format.
pub const MANIFEST_VERSION: u32 = 1;

/// File name used when no manifest path is configured.
pub const DEFAULT_MANIFEST_FILE: &str = "duplicates-to-remove.json";

/// Paths judged safe to remove, in group order then member order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalManifest {
    /// Format version.
    pub version: u32,
    /// When the manifest was created. Absent for bare-array manifests.
    pub created_at: Option<DateTime<Utc>>,
    /// Directory that was scanned. Absent for bare-array manifests.
    pub root: Option<PathBuf>,
    /// Files to remove.
    pub paths: Vec<PathBuf>,
}

impl RemovalManifest {
    /// Create a manifest for `root` with the current timestamp.
    pub fn new(root: PathBuf, paths: Vec<PathBuf>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            created_at: Some(Utc::now()),
            root: Some(root),
            paths,
        }
    }

    /// Build the manifest from verified groups: all but the first member of
    /// every confirmed group.
    ///
    /// A root that is not valid UTF-8 is left out, since JSON cannot hold it.
    pub fn from_groups(root: PathBuf, groups: &[GroupVerification]) -> Self {
        let mut manifest = Self::new(root, removal_list(groups));
        if manifest.root.as_deref().is_some_and(|r| r.to_str().is_none()) {
            log::warn!("Scan root is not valid UTF-8; omitting it from the manifest");
            manifest.root = None;
        }
        manifest
    }

    /// Wrap a bare list of paths.
    pub(crate) fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            created_at: None,
            root: None,
            paths,
        }
    }

    /// Number of listed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
