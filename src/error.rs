//! Crate error type.

use std::io;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LeakPathError>;

/// Errors raised at the I/O boundaries of a leak-path run.
///
/// Graph ingestion, path search and record formatting never fail on their own;
/// these variants cover reading trace logs and candidate lists and writing records.
#[derive(Debug, Error)]
pub enum LeakPathError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// An address string could not be parsed.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
    /// A trace log line was rejected in strict mode.
    #[error("malformed trace at line {line}: {reason}")]
    MalformedTrace {
        /// One-based line number in the log.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
}
