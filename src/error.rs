use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a stage outright.
///
/// Per-target verification failures are deliberately absent: a failed probe
/// only drops that target from the output and is never surfaced as an error.
#[derive(Debug, Error)]
pub enum Error {
    /// A precondition failed before any work started: missing engine binary,
    /// missing/unreadable raw output file, or unwritable parsed output file.
    #[error("setup failed for {path}: {reason}")]
    Setup { path: PathBuf, reason: String },

    /// The scan engine exited nonzero. Carries the captured stderr text when
    /// there was any, otherwise the process error string.
    #[error("scan engine failed: {message}")]
    Subprocess { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn setup(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Setup {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
