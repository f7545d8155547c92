// src/error.rs

//! Error types shared by the library
//!
//! Every failure in the install pipeline is fatal: nothing here is retried
//! or rolled back, errors are surfaced to the caller as-is.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while cooking, installing or verifying a package
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Initialization failed: {0}")]
    InitError(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Dependency resolution failed: {0}")]
    ResolutionError(String),

    #[error("{phase} phase failed with exit code {code:?}\nstderr: {stderr}")]
    BuildFailed {
        phase: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("No version matching the stability rule found at {url}")]
    VersionNotFound { url: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),
}
