//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Cancellation is deliberately absent: a cancelled run ends in
/// [`ScanOutcome::Cancelled`](super::session::ScanOutcome), never in an error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error for a candidate file or an input artifact.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// The hits output could not be opened or written. Aborts the run.
    #[error("Cannot write hits file {1}: {0}")]
    HitsFile(#[source] std::io::Error, PathBuf),

    /// Represents an error during the parsing or building of a glob pattern.
    #[error("Invalid glob pattern: {0}")]
    GlobPattern(#[from] globset::Error),

    /// A search or ignore string uses a character that is also a delimiter.
    #[error("Character '{character}' in \"{pattern}\" is also a delimiter")]
    DelimiterConflict { character: char, pattern: String },

    /// The date range is inverted.
    #[error("Date from ({from}) is later than date to ({to})")]
    InvalidDateRange { from: String, to: String },

    /// A date bound lies in the future.
    #[error("Date {0} lies in the future")]
    DateInFuture(String),

    /// The search path cannot be used for enumeration.
    #[error("Invalid search path: {0}")]
    InvalidPathPattern(String),

    /// Re-filtering was requested but there is no previous hits file.
    #[error("No previous hits file at {0}")]
    NoPreviousHits(PathBuf),

    /// A match or ignore rule name/index is not recognised.
    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

impl CoreError {
    /// `true` for errors caused by the search criteria rather than the environment.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::GlobPattern(_)
                | CoreError::DelimiterConflict { .. }
                | CoreError::InvalidDateRange { .. }
                | CoreError::DateInFuture(_)
                | CoreError::InvalidPathPattern(_)
                | CoreError::NoPreviousHits(_)
                | CoreError::UnknownRule(_)
        )
    }
}
