//! Quick signatures built from sampled byte windows.
//!
//! # Overview
//!
//! A quick signature is a cheap fingerprint of a file that avoids reading the
//! whole content. It combines the recorded file size with three fixed-size
//! windows sampled from the start, the middle and the end of the file:
//!
//! ```text
//! <size>-<hex(start[32] ++ middle[32] ++ end[32])>
//! ```
//!
//! Files of different size can never share a signature. Files of equal size
//! share one only when all three windows match, which is rare for different
//! content but possible; the group verifier settles those cases with a
//! full-content hash.
//!
//! Files below [`MIN_SIGNATURE_SIZE`] are not sampled at all and are reported
//! as [`SignatureOutcome::TooSmall`].

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::FileEntry;

/// Files smaller than this are excluded from deduplication.
pub const MIN_SIGNATURE_SIZE: u64 = 100;

/// Size of each sampled window in bytes.
pub const SAMPLE_WINDOW: usize = 32;

/// Number of sampled windows (start, middle, end).
const WINDOW_COUNT: usize = 3;

/// Cheap size-plus-sample fingerprint of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuickSignature(String);

impl QuickSignature {
    /// Build the signature string from a recorded size and the 96-byte sample.
    #[must_use]
    pub fn from_sample(size: u64, sample: &[u8]) -> Self {
        Self(format!("{}-{}", size, hex::encode(sample)))
    }

    /// The signature as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The size component of the signature.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.0.split_once('-').and_then(|(size, _)| size.parse().ok())
    }
}

impl fmt::Display for QuickSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do when a sampled window returns fewer bytes than requested.
///
/// A short read means the file changed size since it was discovered, or the
/// filesystem misreported its length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ShortReadPolicy {
    /// Fail the signature for that file; it is reported and excluded.
    #[default]
    Fail,
    /// Keep the missing bytes zeroed and continue with a read warning.
    ZeroPad,
}

/// Errors raised while sampling a file.
#[derive(thiserror::Error, Debug)]
pub enum SignatureError {
    /// A window returned fewer bytes than requested.
    #[error("Short read for {path} at offset {offset}: expected {expected} bytes, got {actual}")]
    PartialRead {
        /// File being sampled
        path: PathBuf,
        /// Offset of the window
        offset: u64,
        /// Bytes requested
        expected: usize,
        /// Bytes actually read
        actual: usize,
    },

    /// The file could not be opened or read.
    #[error("Failed reading {path}: {source}")]
    Io {
        /// File being sampled
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl SignatureError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PartialRead { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// Result of computing a quick signature for one file.
#[derive(Debug)]
pub enum SignatureOutcome {
    /// The signature was computed from three full windows.
    Signature(QuickSignature),
    /// The signature was computed from a zero-padded sample
    /// ([`ShortReadPolicy::ZeroPad`] only). Carries the first short read.
    Padded {
        /// Signature computed from the padded sample
        signature: QuickSignature,
        /// The short read that triggered padding
        warning: SignatureError,
    },
    /// The file is below [`MIN_SIGNATURE_SIZE`] and is excluded.
    TooSmall,
    /// The file could not be sampled.
    ReadError(SignatureError),
}

impl SignatureOutcome {
    /// The computed signature, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&QuickSignature> {
        match self {
            Self::Signature(sig) | Self::Padded { signature: sig, .. } => Some(sig),
            Self::TooSmall | Self::ReadError(_) => None,
        }
    }
}

/// Byte offsets of the start, middle and end windows for a file of `size` bytes.
///
/// Windows may overlap for small files.
#[must_use]
pub fn window_offsets(size: u64) -> [u64; WINDOW_COUNT] {
    [0, size / 2, size.saturating_sub(SAMPLE_WINDOW as u64)]
}

/// Compute the quick signature for a discovered file.
///
/// The recorded `entry.size` is used both for the signature key and for the
/// window offsets; the file itself is only read, never modified.
///
/// # Example
///
/// ```no_run
/// use quickdupe::scanner::{compute_signature, FileEntry, ShortReadPolicy, SignatureOutcome};
/// use std::path::PathBuf;
///
/// let entry = FileEntry::new(PathBuf::from("movie.mkv"), 4_000_000);
/// match compute_signature(&entry, ShortReadPolicy::Fail) {
///     SignatureOutcome::Signature(sig) => println!("{}", sig),
///     other => println!("{:?}", other),
/// }
/// ```
#[must_use]
pub fn compute_signature(entry: &FileEntry, policy: ShortReadPolicy) -> SignatureOutcome {
    if entry.size < MIN_SIGNATURE_SIZE {
        return SignatureOutcome::TooSmall;
    }

    let io_error = |source: io::Error| SignatureError::Io {
        path: entry.path.clone(),
        source,
    };

    let mut file = match File::open(&entry.path) {
        Ok(f) => f,
        Err(e) => return SignatureOutcome::ReadError(io_error(e)),
    };

    let mut sample = [0u8; SAMPLE_WINDOW * WINDOW_COUNT];
    let mut warning = None;

    for (window, offset) in sample
        .chunks_exact_mut(SAMPLE_WINDOW)
        .zip(window_offsets(entry.size))
    {
        let actual = match read_window(&mut file, offset, window) {
            Ok(n) => n,
            Err(e) => return SignatureOutcome::ReadError(io_error(e)),
        };

        if actual < SAMPLE_WINDOW {
            let short = SignatureError::PartialRead {
                path: entry.path.clone(),
                offset,
                expected: SAMPLE_WINDOW,
                actual,
            };
            match policy {
                ShortReadPolicy::Fail => return SignatureOutcome::ReadError(short),
                ShortReadPolicy::ZeroPad => {
                    log::debug!("{}", short);
                    warning.get_or_insert(short);
                }
            }
        }
    }

    let signature = QuickSignature::from_sample(entry.size, &sample);
    log::trace!("Signature {} for {}", signature, entry.path.display());

    match warning {
        Some(warning) => SignatureOutcome::Padded { signature, warning },
        None => SignatureOutcome::Signature(signature),
    }
}

/// Fill `window` from `offset`, returning how many bytes were read before EOF.
fn read_window(file: &mut File, offset: u64, window: &mut [u8]) -> io::Result<usize> {
    file.seek(SeekFrom::Start(offset))?;

    let mut filled = 0;
    while filled < window.len() {
        match file.read(&mut window[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
