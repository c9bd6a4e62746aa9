//! Error types.
//!
//! The engine recovers from malformed input locally, so the only failures that
//! reach a caller come from persistence or from the command line front end.

use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing the task database.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt task database at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by the command line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Could not understand date '{0}'")]
    InvalidDate(String),

    #[error("Could not understand time '{0}'")]
    InvalidTime(String),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Result type alias for StoreError
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
