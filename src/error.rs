//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the quickdupe binary.
///
/// - 0: Success (scan found removable duplicates, or quarantine ran to the end)
/// - 1: General error (missing or corrupt manifest, bad root, I/O failure)
/// - 2: No duplicates found (scan completed, manifest is empty)
/// - 3: Partial success (scan completed, but some files could not be read)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed with nothing left unresolved.
    Success = 0,
    /// General error: a fatal error stopped the run.
    GeneralError = 1,
    /// No duplicates: the scan completed and nothing is removable.
    NoDuplicates = 2,
    /// Partial success: completed, with per-file failures.
    PartialSuccess = 3,
    /// Interrupted: stopped by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "QD000",
            Self::GeneralError => "QD001",
            Self::NoDuplicates => "QD002",
            Self::PartialSuccess => "QD003",
            Self::Interrupted => "QD130",
        }
    }

    /// Pick the exit code for a fatal error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let interrupted = err
            .downcast_ref::<crate::duplicates::FinderError>()
            .is_some_and(|e| matches!(e, crate::duplicates::FinderError::Interrupted));
        if interrupted {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "QD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
