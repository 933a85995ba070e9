//! Error types for attempts, exhausted items and rejected batches.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::UnknownFormat;

/// Why one attempt failed. Always retried while budget remains.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The tool could not be started (missing binary, permissions).
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// Reading the tool's output or waiting for it failed.
    #[error("I/O error while running the tool: {0}")]
    Io(#[from] std::io::Error),
    #[error("attempt timed out after {0} s")]
    TimedOut(u64),
    /// The tool ran but left no evidence of a downloaded file.
    #[error("Download failed: {message}")]
    Failed {
        exit_code: Option<i32>,
        message: String,
    },
}

/// All attempts for one URL failed.
#[derive(Debug, Clone, Error)]
#[error("{url}: giving up after {attempts} attempts: {message}")]
pub struct ExhaustedError {
    pub url: String,
    pub attempts: u32,
    /// Error text of the last attempt.
    pub message: String,
}

/// Outcome of a runner call that did not succeed.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Exhausted(#[from] ExhaustedError),
    #[error("download cancelled")]
    Aborted,
}

/// A batch rejected before any work started.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("batch contains no URLs")]
    EmptyBatch,
    #[error(transparent)]
    InvalidFormat(#[from] UnknownFormat),
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_display_carries_last_error() {
        let e = ItemError::from(ExhaustedError {
            url: "https://example.com/v".to_string(),
            attempts: 10,
            message: "ERROR: Video unavailable".to_string(),
        });
        assert_eq!(
            e.to_string(),
            "https://example.com/v: giving up after 10 attempts: ERROR: Video unavailable"
        );
    }

    #[test]
    fn unknown_format_converts() {
        let e: ConfigError = "avi".parse::<crate::format::MediaFormat>().unwrap_err().into();
        assert!(matches!(e, ConfigError::InvalidFormat(_)));
    }
}
