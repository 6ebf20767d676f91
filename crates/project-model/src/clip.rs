//! Clip types: a trimmed placement of a source file on a track.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Unique clip identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

/// Unique track identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl ClipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(format!("clip-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(format!("track-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Stream properties of a source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub frame_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
}

/// Compressed (JPEG) still frame representing a source.
///
/// Regenerable and never persisted. Cloning shares the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    jpeg: Arc<[u8]>,
}

impl Thumbnail {
    pub fn from_jpeg(bytes: Vec<u8>) -> Self {
        Self { jpeg: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thumbnail({} bytes)", self.jpeg.len())
    }
}

/// A source file placed on the timeline.
///
/// `trim_start`/`trim_end` are offsets into the source; `start_time` is the
/// position on the timeline. The clip occupies
/// `[start_time, start_time + (trim_end - trim_start))`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    pub file_path: PathBuf,
    /// Full duration of the source file.
    pub duration: f64,
    pub start_time: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub track_id: TrackId,
    pub thumbnail: Option<Thumbnail>,
    pub metadata: Option<VideoMetadata>,
}

impl Clip {
    /// A clip spanning the whole source, placed at time zero.
    pub fn new(track_id: TrackId, file_path: impl Into<PathBuf>, source_duration: f64) -> Self {
        let file_path = file_path.into();
        Self {
            id: ClipId::generate(),
            name: file_name(&file_path),
            file_path,
            duration: source_duration,
            start_time: 0.0,
            trim_start: 0.0,
            trim_end: source_duration,
            track_id,
            thumbnail: None,
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = ClipId::new(id);
        self
    }

    pub fn at(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_trim(mut self, trim_start: f64, trim_end: f64) -> Self {
        self.trim_start = trim_start;
        self.trim_end = trim_end;
        self
    }

    /// Length on the timeline.
    pub fn length(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    /// Timeline time where the clip ends (exclusive).
    pub fn end(&self) -> f64 {
        self.start_time + self.length()
    }

    /// Whether timeline time `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t < self.end()
    }

    /// Source-relative time for a timeline time. Not bounded to the trim range.
    pub fn source_time_at(&self, timeline_time: f64) -> f64 {
        self.trim_start + (timeline_time - self.start_time)
    }

    /// Timeline time for a source-relative time.
    pub fn timeline_time_at(&self, source_time: f64) -> f64 {
        self.start_time + (source_time - self.trim_start)
    }

    /// Whether `[start, start + length)` intersects this clip.
    pub fn overlaps(&self, start: f64, length: f64) -> bool {
        start < self.end() && self.start_time < start + length
    }
}

/// Partial clip update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipUpdate {
    pub name: Option<String>,
    pub start_time: Option<f64>,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
}

impl ClipUpdate {
    pub fn start_time(start_time: f64) -> Self {
        Self {
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    pub fn trim_in(trim_start: f64, start_time: f64) -> Self {
        Self {
            trim_start: Some(trim_start),
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    pub fn trim_out(trim_end: f64) -> Self {
        Self {
            trim_end: Some(trim_end),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_time.is_none()
            && self.trim_start.is_none()
            && self.trim_end.is_none()
    }

    pub(crate) fn apply(self, clip: &mut Clip) {
        if let Some(name) = self.name {
            clip.name = name;
        }
        if let Some(start_time) = self.start_time {
            clip.start_time = start_time;
        }
        if let Some(trim_start) = self.trim_start {
            clip.trim_start = trim_start;
        }
        if let Some(trim_end) = self.trim_end {
            clip.trim_end = trim_end;
        }
    }
}

/// Display name for a source path: its final component.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string())
}
