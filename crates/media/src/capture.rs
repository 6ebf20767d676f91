//! Finalizing screen and webcam recordings.
//!
//! A capture backend hands over the raw encoded bytes once recording stops.
//! They are written to the recordings directory and from then on behave like
//! any imported file.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Screen,
    Webcam,
}

impl CaptureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureKind::Screen => "screen",
            CaptureKind::Webcam => "webcam",
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recording written to disk, ready for import.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedRecording {
    pub path: PathBuf,
    pub kind: CaptureKind,
    /// Wall-clock length of the recording. Used when the container carries
    /// no usable duration, which is common for streamed WebM.
    pub recorded_secs: f64,
}

/// `screen-2024-05-01T10-22-03-123Z.webm`
pub fn recording_file_name(kind: CaptureKind, at: DateTime<Utc>) -> String {
    format!("{kind}-{}.webm", at.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

/// Write a finished recording into `dir`.
pub async fn finalize_recording(
    dir: &Path,
    kind: CaptureKind,
    bytes: Vec<u8>,
    recorded_secs: f64,
) -> Result<FinishedRecording, CaptureError> {
    if bytes.is_empty() {
        return Err(CaptureError::Empty);
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CaptureError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let path = dir.join(recording_file_name(kind, Utc::now()));
    let size = bytes.len();
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| CaptureError::Io {
            path: path.clone(),
            source: e,
        })?;

    tracing::info!(path = %path.display(), %kind, bytes = size, recorded_secs, "Recording finalized");
    Ok(FinishedRecording {
        path,
        kind,
        recorded_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_recording_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 22, 3).unwrap();
        assert_eq!(
            recording_file_name(CaptureKind::Webcam, at),
            "webcam-2024-05-01T10-22-03-000Z.webm"
        );
    }

    #[tokio::test]
    async fn test_finalize_writes_into_dir() {
        let dir = std::env::temp_dir().join(format!("clipforge_capture_{}", uuid::Uuid::new_v4().simple()));

        let recording = finalize_recording(&dir, CaptureKind::Screen, vec![1, 2, 3], 4.0)
            .await
            .unwrap();
        assert!(recording.path.starts_with(&dir));
        assert!(recording.path.to_string_lossy().ends_with(".webm"));
        assert_eq!(std::fs::read(&recording.path).unwrap(), vec![1, 2, 3]);

        assert!(matches!(
            finalize_recording(&dir, CaptureKind::Screen, Vec::new(), 1.0).await,
            Err(CaptureError::Empty)
        ));
        std::fs::remove_dir_all(&dir).ok();
    }
}
