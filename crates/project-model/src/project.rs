//! Project files: the versioned JSON snapshot of timeline + library.
//!
//! Thumbnails and transient playback state (selection) are never written.
//! Loading rejects documents missing `version` or `timeline` before any
//! state is built, so a bad file never partially applies.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clipforge_common::EditorDefaults;
use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId, TrackId, VideoMetadata};
use crate::library::{Library, LibraryItem};
use crate::store::EditorState;
use crate::timeline::{Timeline, Track, ZoomRange};

/// Schema version written by this build.
pub const PROJECT_VERSION: &str = "1.0";

/// Conventional project file extension.
pub const PROJECT_EXTENSION: &str = "clipforge";

/// Top-level project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    pub timeline: ProjectTimeline,
    #[serde(default)]
    pub library: Vec<ProjectLibraryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeline {
    #[serde(default)]
    pub tracks: Vec<ProjectTrack>,
    #[serde(default)]
    pub playhead_position: f64,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTrack {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub clips: Vec<ProjectClip>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_muted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectClip {
    pub id: ClipId,
    pub name: String,
    pub file_path: PathBuf,
    pub duration: f64,
    pub start_time: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub track_id: TrackId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VideoMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLibraryItem {
    pub file_path: PathBuf,
    pub name: String,
    pub duration: f64,
    #[serde(default)]
    pub metadata: Option<VideoMetadata>,
}

fn default_zoom() -> f64 {
    EditorDefaults::default().default_zoom
}

fn default_true() -> bool {
    true
}

impl From<&Clip> for ProjectClip {
    fn from(clip: &Clip) -> Self {
        Self {
            id: clip.id.clone(),
            name: clip.name.clone(),
            file_path: clip.file_path.clone(),
            duration: clip.duration,
            start_time: clip.start_time,
            trim_start: clip.trim_start,
            trim_end: clip.trim_end,
            track_id: clip.track_id.clone(),
            metadata: clip.metadata.clone(),
        }
    }
}

impl From<&LibraryItem> for ProjectLibraryItem {
    fn from(item: &LibraryItem) -> Self {
        Self {
            file_path: item.file_path.clone(),
            name: item.name.clone(),
            duration: item.duration,
            metadata: item.metadata.clone(),
        }
    }
}

impl ProjectFile {
    /// Capture the persistable part of the editor state.
    pub fn snapshot(state: &EditorState) -> Self {
        let timeline = &state.timeline;
        let tracks = timeline
            .tracks()
            .iter()
            .map(|track| ProjectTrack {
                id: track.id.clone(),
                name: track.name.clone(),
                clips: track.clips.iter().map(ProjectClip::from).collect(),
                is_visible: track.is_visible,
                is_muted: track.is_muted,
            })
            .collect();

        Self {
            version: PROJECT_VERSION.to_string(),
            name: state.name.clone(),
            created_at: state.created_at,
            updated_at: Utc::now(),
            timeline: ProjectTimeline {
                tracks,
                playhead_position: timeline.playhead_position(),
                zoom: timeline.zoom(),
                duration: timeline.duration(),
            },
            library: state.library.items().iter().map(ProjectLibraryItem::from).collect(),
        }
    }

    /// Rebuild editor state. Thumbnails come back empty and nothing is selected.
    pub fn into_state(self, defaults: &EditorDefaults) -> EditorState {
        let tracks = self
            .timeline
            .tracks
            .into_iter()
            .map(|track| {
                let clips = track
                    .clips
                    .into_iter()
                    .map(|c| {
                        if c.track_id != track.id {
                            tracing::warn!(
                                clip = %c.id,
                                claimed = %c.track_id,
                                track = %track.id,
                                "Clip listed under a different track; keeping it where it is listed"
                            );
                        }
                        Clip {
                            id: c.id,
                            name: c.name,
                            file_path: c.file_path,
                            duration: c.duration,
                            start_time: c.start_time,
                            trim_start: c.trim_start,
                            trim_end: c.trim_end,
                            track_id: track.id.clone(),
                            thumbnail: None,
                            metadata: c.metadata,
                        }
                    })
                    .collect();
                Track {
                    id: track.id,
                    name: track.name,
                    clips,
                    is_visible: track.is_visible,
                    is_muted: track.is_muted,
                }
            })
            .collect();

        let timeline = Timeline::from_parts(
            tracks,
            self.timeline.playhead_position,
            self.timeline.zoom,
            self.timeline.duration,
            ZoomRange::from_defaults(defaults),
        );

        let library = self
            .library
            .into_iter()
            .map(|item| LibraryItem {
                file_path: item.file_path,
                name: item.name,
                duration: item.duration,
                thumbnail: None,
                metadata: item.metadata,
            })
            .collect::<Library>();

        EditorState {
            name: self.name,
            created_at: self.created_at,
            timeline,
            library,
        }
    }

    /// Parse a project document.
    pub fn from_json(content: &str) -> Result<Self, ProjectError> {
        Self::parse(content, Path::new("<inline>"))
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        serde_json::to_string_pretty(self).map_err(|e| ProjectError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, ProjectError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ProjectError::ParseError {
                path: origin.to_path_buf(),
                source: e,
            })?;

        for required in ["version", "timeline"] {
            if value.get(required).map_or(true, serde_json::Value::is_null) {
                return Err(ProjectError::InvalidFormat {
                    message: format!("missing required field `{required}`"),
                });
            }
        }

        serde_json::from_value(value).map_err(|e| ProjectError::ParseError {
            path: origin.to_path_buf(),
            source: e,
        })
    }

    /// Load a project file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let project = Self::parse(&content, path)?;
        tracing::info!(
            path = %path.display(),
            version = %project.version,
            tracks = project.timeline.tracks.len(),
            "Project loaded"
        );
        Ok(project)
    }

    /// Write the project file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), "Project saved");
        Ok(())
    }

    /// Report referenced source files that no longer exist.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        for track in &self.timeline.tracks {
            for clip in &track.clips {
                if !clip.file_path.exists() {
                    errors.push(format!(
                        "Clip {} source missing: {}",
                        clip.id,
                        clip.file_path.display()
                    ));
                }
            }
        }
        for item in &self.library {
            if !item.file_path.exists() {
                errors.push(format!(
                    "Library source missing: {}",
                    item.file_path.display()
                ));
            }
        }

        errors
    }

    pub fn clip_count(&self) -> usize {
        self.timeline.tracks.iter().map(|t| t.clips.len()).sum()
    }
}

/// Errors that can occur when working with project files.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project file: {message}")]
    InvalidFormat { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Thumbnail;
    use crate::timeline::DEFAULT_TRACK_ID;
    use proptest::prelude::*;

    fn populated_state() -> EditorState {
        let mut state = EditorState::new("Holiday");
        let track = TrackId::new(DEFAULT_TRACK_ID);

        let mut clip = Clip::new(track.clone(), "/media/a.mp4", 10.0)
            .with_id("a")
            .with_trim(1.0, 6.0);
        clip.thumbnail = Some(Thumbnail::from_jpeg(vec![0xFF, 0xD8]));
        clip.metadata = Some(VideoMetadata {
            width: 1920,
            height: 1080,
            codec: "h264".into(),
            frame_rate: 30.0,
            bitrate: None,
        });
        state.timeline.add_clip(clip).unwrap();
        state
            .timeline
            .add_clip(Clip::new(track, "/media/b.mp4", 4.0).with_id("b").at(7.0))
            .unwrap();
        state.timeline.set_playhead_position(3.0);
        state.timeline.select_clip(Some(ClipId::new("b")));

        let mut item = LibraryItem::new("/media/a.mp4", 10.0);
        item.thumbnail = Some(Thumbnail::from_jpeg(vec![1, 2, 3]));
        state.library.add(item);
        state
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let state = populated_state();
        let json = ProjectFile::snapshot(&state).to_json().unwrap();
        let restored = ProjectFile::from_json(&json)
            .unwrap()
            .into_state(&EditorDefaults::default());

        assert_eq!(restored.name, "Holiday");
        assert_eq!(restored.timeline.tracks().len(), state.timeline.tracks().len());
        for (a, b) in state.timeline.tracks().iter().zip(restored.timeline.tracks()) {
            assert_eq!((&a.id, &a.name, a.is_visible, a.is_muted), (&b.id, &b.name, b.is_visible, b.is_muted));
            for (x, y) in a.clips.iter().zip(&b.clips) {
                assert_eq!(x.id, y.id);
                assert_eq!(x.file_path, y.file_path);
                assert_eq!(x.start_time, y.start_time);
                assert_eq!(x.trim_start, y.trim_start);
                assert_eq!(x.trim_end, y.trim_end);
                assert_eq!(x.track_id, y.track_id);
                assert_eq!(x.metadata, y.metadata);
                assert!(y.thumbnail.is_none());
            }
        }
        assert_eq!(restored.timeline.playhead_position(), 3.0);
        assert_eq!(restored.timeline.duration(), 11.0);
        assert!(restored.timeline.selected_clip_id().is_none());
        assert!(restored.library.items()[0].thumbnail.is_none());
    }

    #[test]
    fn test_snapshot_never_writes_thumbnails() {
        let json = ProjectFile::snapshot(&populated_state()).to_json().unwrap();
        assert!(!json.contains("thumbnail"));
        assert!(json.contains("\"playheadPosition\""));
        assert!(json.contains("\"trimStart\""));
        assert!(json.contains("\"version\": \"1.0\""));
    }

    #[test]
    fn test_missing_required_fields_are_invalid_format() {
        let no_version = r#"{"name": "x", "timeline": {"tracks": []}, "library": []}"#;
        assert!(matches!(
            ProjectFile::from_json(no_version),
            Err(ProjectError::InvalidFormat { .. })
        ));

        let no_timeline = r#"{"version": "1.0", "name": "x", "library": []}"#;
        let err = ProjectFile::from_json(no_timeline).unwrap_err();
        assert!(err.to_string().contains("timeline"));

        let null_version = r#"{"version": null, "name": "x", "timeline": {"tracks": []}, "library": []}"#;
        assert!(matches!(
            ProjectFile::from_json(null_version),
            Err(ProjectError::InvalidFormat { .. })
        ));

        assert!(matches!(
            ProjectFile::from_json("not json"),
            Err(ProjectError::ParseError { .. })
        ));
    }

    #[test]
    fn test_lenient_library_metadata() {
        let json = r#"{
            "version": "1.0",
            "name": "legacy",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "timeline": {"tracks": [], "playheadPosition": 0, "zoom": 20, "duration": 0},
            "library": [{"filePath": "/a.mp4", "name": "a.mp4", "duration": 3, "metadata": {}}]
        }"#;
        let project = ProjectFile::from_json(json).unwrap();
        assert_eq!(project.library[0].metadata, Some(VideoMetadata::default()));
    }

    #[test]
    fn test_save_and_load_from_disk() {
        let dir = std::env::temp_dir().join(format!("clipforge_project_{}", uuid::Uuid::new_v4().simple()));
        let path = dir.join("holiday.clipforge");

        ProjectFile::snapshot(&populated_state()).save(&path).unwrap();
        let loaded = ProjectFile::load(&path).unwrap();
        assert_eq!(loaded.clip_count(), 2);

        let missing = loaded.validate_sources();
        assert!(missing.iter().any(|e| e.contains("Clip a source missing")));
        assert!(missing.iter().any(|e| e.contains("Library source missing")));

        std::fs::remove_dir_all(&dir).ok();
    }

    proptest! {
        #[test]
        fn prop_round_trip_clip_placement(
            quarters in proptest::collection::vec((0u32..240, 0u32..16, 18u32..36), 0..8),
            muted in any::<bool>(),
        ) {
            let spans: Vec<(f64, f64, f64)> = quarters
                .iter()
                .map(|(s, a, b)| (*s as f64 * 0.25, *a as f64 * 0.25, *b as f64 * 0.25))
                .collect();
            let mut state = EditorState::new("prop");
            state.timeline.add_track(Track { is_muted: muted, ..Track::new(TrackId::new("track-2"), "Overlay") }).unwrap();
            for (i, (start, trim_start, trim_end)) in spans.iter().enumerate() {
                let track = if i % 2 == 0 { DEFAULT_TRACK_ID } else { "track-2" };
                state.timeline.add_clip(
                    Clip::new(TrackId::new(track), format!("/m/{i}.mp4"), 10.0)
                        .with_trim(*trim_start, *trim_end)
                        .at(*start),
                ).unwrap();
            }

            let json = ProjectFile::snapshot(&state).to_json().unwrap();
            let restored = ProjectFile::from_json(&json).unwrap().into_state(&EditorDefaults::default());

            let before: Vec<_> = state.timeline.clips().map(|c| (c.id.clone(), c.file_path.clone(), c.start_time, c.trim_start, c.trim_end, c.track_id.clone())).collect();
            let after: Vec<_> = restored.timeline.clips().map(|c| (c.id.clone(), c.file_path.clone(), c.start_time, c.trim_start, c.trim_end, c.track_id.clone())).collect();
            prop_assert_eq!(before, after);
            prop_assert_eq!(restored.timeline.tracks()[1].is_muted, muted);
        }
    }
}
