//! I/O operations for removal manifests.

use crate::manifest::data::{RemovalManifest, MANIFEST_VERSION};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors raised while saving or loading a manifest.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),

    /// The manifest could not be parsed.
    #[error("Manifest is corrupt: {path}: {reason}")]
    Corrupt {
        /// Manifest file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The stored checksum does not match the content.
    #[error("Manifest integrity check failed: checksum mismatch in {0}")]
    ChecksumMismatch(PathBuf),

    /// The manifest was written by an incompatible version.
    #[error("Unsupported manifest version: {found}. Current version is {expected}.")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// The manifest could not be serialized.
    #[error("Failed to serialize manifest")]
    Serialize(#[from] serde_json::Error),

    /// Reading or writing the file failed.
    #[error("I/O error on manifest {path}: {source}")]
    Io {
        /// Manifest file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    /// Check if the file exists but could not be trusted.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::Corrupt { .. } | Self::ChecksumMismatch(_) | Self::UnsupportedVersion { .. }
        )
    }
}

/// Envelope for manifest files to include integrity checks.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestEnvelope {
    /// SHA256 checksum of the compact serialized manifest.
    checksum: String,
    /// The manifest itself.
    manifest: RemovalManifest,
}

/// Either on-disk form accepted by [`RemovalManifest::load`].
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Envelope(ManifestEnvelope),
    Legacy(Vec<PathBuf>),
}

fn checksum_of(manifest: &RemovalManifest) -> Result<String, serde_json::Error> {
    // Always over the compact form; the file itself is pretty-printed.
    let compact = serde_json::to_string(manifest)?;
    let mut hasher = Sha256::new();
    hasher.update(compact.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Temporary sibling used for atomic replacement of `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

impl RemovalManifest {
    /// Serializes the manifest to a pretty JSON envelope with a checksum.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        let envelope = ManifestEnvelope {
            checksum: checksum_of(self)?,
            manifest: self.clone(),
        };
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    /// Saves the manifest, replacing any existing file at `path`.
    ///
    /// The content is written to a temporary sibling, synced and renamed over
    /// the target.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be written or renamed.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;
        let temp_path = temp_path_for(path);
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };

        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };

        if let Err(e) = write_temp() {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(e));
        }

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(e));
        }

        log::debug!(
            "Saved manifest with {} entries to {}",
            self.paths.len(),
            path.display()
        );
        Ok(())
    }

    /// Loads a manifest and verifies its integrity.
    ///
    /// A bare JSON array of paths is accepted as a manifest without metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the file is missing,
    /// [`ManifestError::Corrupt`] if it cannot be parsed,
    /// [`ManifestError::ChecksumMismatch`] if it was altered, and
    /// [`ManifestError::UnsupportedVersion`] for unknown versions.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ManifestError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::InvalidData => ManifestError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
            _ => ManifestError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let parsed: ManifestFile =
            serde_json::from_str(&content).map_err(|e| ManifestError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let envelope = match parsed {
            ManifestFile::Legacy(paths) => {
                log::debug!(
                    "Loaded bare-array manifest with {} entries from {}",
                    paths.len(),
                    path.display()
                );
                return Ok(Self::from_paths(paths));
            }
            ManifestFile::Envelope(envelope) => envelope,
        };

        if checksum_of(&envelope.manifest)? != envelope.checksum {
            return Err(ManifestError::ChecksumMismatch(path.to_path_buf()));
        }

        let manifest = envelope.manifest;
        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: manifest.version,
                expected: MANIFEST_VERSION,
            });
        }

        log::debug!(
            "Loaded manifest with {} entries from {}",
            manifest.paths.len(),
            path.display()
        );
        Ok(manifest)
    }
}
