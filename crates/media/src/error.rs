//! Media error types.

use std::path::PathBuf;
use std::time::Duration;

use clipforge_common::ClipforgeError;
use thiserror::Error;

/// Why a source's duration, metadata, or thumbnail could not be derived.
///
/// Import treats every variant as "skip this file".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataExtractionError {
    #[error("Invalid duration {duration} in {path}")]
    InvalidDuration { path: PathBuf, duration: f64 },

    #[error("Cannot read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("Timed out after {}s reading {path}", .timeout.as_secs_f64())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("{tool} is not available: {message}")]
    ToolUnavailable { tool: String, message: String },
}

impl MetadataExtractionError {
    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Capture finalization failures.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Recording contains no data")]
    Empty,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<MetadataExtractionError> for ClipforgeError {
    fn from(err: MetadataExtractionError) -> Self {
        ClipforgeError::media(err.to_string())
    }
}

impl From<CaptureError> for ClipforgeError {
    fn from(err: CaptureError) -> Self {
        ClipforgeError::media(err.to_string())
    }
}
