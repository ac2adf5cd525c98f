//! Removal manifest: the persisted list of files safe to remove.
//!
//! A scan writes the manifest once it has finished; the quarantine step reads
//! it back in a later invocation.
//!
//! # Features
//!
//! * **Integrity**: the manifest is wrapped in an envelope with a SHA256 checksum.
//! * **Atomicity**: files are written to a temporary sibling and renamed into
//!   place, so a half-written manifest is never observed.
//! * **Compatibility**: a bare JSON array of paths is still accepted on load.
//!
//! # Architecture
//!
//! * [`data`]: the serializable manifest model.
//! * [`io`]: saving, loading and verifying manifest files.

pub mod data;
pub mod io;

pub use data::{RemovalManifest, DEFAULT_MANIFEST_FILE, MANIFEST_VERSION};
pub use io::ManifestError;
