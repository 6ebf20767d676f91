//! Playback error types.

use std::path::{Path, PathBuf};

use clipforge_common::ClipforgeError;
use clipforge_project_model::file_name;
use thiserror::Error;

/// Failures reported by a [`RenderSurface`](crate::RenderSurface).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("No source loaded")]
    NoSource,

    #[error("Seek failed: {message}")]
    Seek { message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The source is missing or unreadable. Playback stops; selection and
    /// playhead are left alone.
    #[error("Failed to load {path}: {reason}")]
    LoadFailure {
        path: PathBuf,
        /// The source lives in the recordings directory.
        temporary: bool,
        reason: String,
    },

    #[error("Seek to {target:.3}s did not settle (surface at {current:.3}s)")]
    SeekTimeout { target: f64, current: f64 },

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("Timeline has no clips to play")]
    NothingToPlay,
}

impl PlaybackError {
    pub(crate) fn load_failure(path: &Path, temporary: bool, source: SurfaceError) -> Self {
        Self::LoadFailure {
            path: path.to_path_buf(),
            temporary,
            reason: source.to_string(),
        }
    }

    /// Text suitable for showing to the user. Temporary recordings get their
    /// own wording since they are usually cleaned up rather than moved.
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::LoadFailure {
                path,
                temporary: true,
                ..
            } => format!(
                "Temporary recording file is missing: {}\n\nThis file may have been deleted.",
                file_name(path)
            ),
            PlaybackError::LoadFailure { path, .. } => format!(
                "Could not load: {}\n\nThe file may be missing, moved, or corrupted.",
                file_name(path)
            ),
            other => other.to_string(),
        }
    }
}

impl From<PlaybackError> for ClipforgeError {
    fn from(err: PlaybackError) -> Self {
        ClipforgeError::playback(err.to_string())
    }
}
