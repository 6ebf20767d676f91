//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Timeline editing defaults.
    pub editor: EditorDefaults,

    /// Preview synchronization tuning.
    pub playback: PlaybackTuning,

    /// Import and metadata extraction settings.
    pub media: MediaDefaults,

    /// Transcoder settings for export.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Timeline editing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Lowest zoom level (pixels per second).
    pub min_zoom: f64,

    /// Highest zoom level (pixels per second).
    pub max_zoom: f64,

    /// Zoom level for new timelines.
    pub default_zoom: f64,

    /// Shortest clip a trim may produce, in seconds.
    pub min_clip_secs: f64,
}

/// Timing constants for the playback synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackTuning {
    /// A seek is accepted once the surface reports a time this close to the target.
    pub seek_tolerance_secs: f64,

    /// Seek attempts before giving up.
    pub max_seek_attempts: u32,

    /// How long one attempt waits for the surface to finish seeking.
    pub seek_timeout_ms: u64,

    /// Backoff between seek attempts.
    pub seek_retry_delay_ms: u64,

    /// Upper bound on waiting for a forced surface reload.
    pub reload_timeout_ms: u64,

    /// Gaps shorter than this are treated as abutting clips.
    pub gap_tolerance_secs: f64,

    /// Software clock tick while traversing a gap.
    pub gap_tick_ms: u64,

    /// Minimum spacing of preview seeks while scrubbing.
    pub scrub_throttle_ms: u64,

    /// How often the progress pump samples the surface while playing.
    pub progress_interval_ms: u64,
}

/// Import and metadata extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDefaults {
    /// Give up on metadata extraction after this many seconds.
    pub metadata_timeout_secs: u64,

    /// Thumbnails are taken at `min(this, duration / 2)`.
    pub thumbnail_max_offset_secs: f64,

    /// Lower-case extensions accepted by import (without the dot).
    pub supported_extensions: Vec<String>,

    /// Where finalized screen/webcam recordings are written.
    pub recordings_dir: PathBuf,
}

/// Transcoder settings for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// x264 preset.
    pub preset: String,

    /// x264 constant rate factor.
    pub crf: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipforge_playback=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            min_zoom: 10.0,
            max_zoom: 100.0,
            default_zoom: 20.0,
            min_clip_secs: 0.5,
        }
    }
}

impl Default for PlaybackTuning {
    fn default() -> Self {
        Self {
            seek_tolerance_secs: 0.03,
            max_seek_attempts: 4,
            seek_timeout_ms: 1200,
            seek_retry_delay_ms: 30,
            reload_timeout_ms: 1000,
            gap_tolerance_secs: 0.05,
            gap_tick_ms: 16,
            scrub_throttle_ms: 16,
            progress_interval_ms: 250,
        }
    }
}

impl PlaybackTuning {
    pub fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }

    pub fn seek_retry_delay(&self) -> Duration {
        Duration::from_millis(self.seek_retry_delay_ms)
    }

    pub fn reload_timeout(&self) -> Duration {
        Duration::from_millis(self.reload_timeout_ms)
    }

    pub fn gap_tick(&self) -> Duration {
        Duration::from_millis(self.gap_tick_ms.max(1))
    }

    pub fn scrub_throttle(&self) -> Duration {
        Duration::from_millis(self.scrub_throttle_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }
}

impl Default for MediaDefaults {
    fn default() -> Self {
        Self {
            metadata_timeout_secs: 10,
            thumbnail_max_offset_secs: 1.0,
            supported_extensions: ["mp4", "mov", "avi", "mkv", "webm"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            recordings_dir: std::env::temp_dir().join("clipforge-recordings"),
        }
    }
}

impl MediaDefaults {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    /// Whether the file extension is one import accepts (case-insensitive).
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.supported_extensions.iter().any(|s| *s == ext))
    }

    /// Whether `path` is a finalized capture living in the recordings directory.
    pub fn is_recording(&self, path: &Path) -> bool {
        path.starts_with(&self.recordings_dir)
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            preset: "fast".to_string(),
            crf: 23,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipforge").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_editor_behaviour() {
        let config = AppConfig::default();
        assert_eq!(config.editor.min_zoom, 10.0);
        assert_eq!(config.editor.max_zoom, 100.0);
        assert_eq!(config.playback.max_seek_attempts, 4);
        assert_eq!(config.playback.seek_timeout(), Duration::from_millis(1200));
        assert_eq!(config.media.metadata_timeout(), Duration::from_secs(10));
        assert!(config
            .media
            .recordings_dir
            .ends_with("clipforge-recordings"));
    }

    #[test]
    fn test_supported_extensions() {
        let media = MediaDefaults::default();
        assert!(media.is_supported(Path::new("/v/clip.MP4")));
        assert!(media.is_supported(Path::new("take.webm")));
        assert!(!media.is_supported(Path::new("notes.txt")));
        assert!(!media.is_supported(Path::new("no_extension")));
        assert!(media.is_recording(&media.recordings_dir.join("screen-1.webm")));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"playback": {"max_seek_attempts": 2}}"#).unwrap();
        assert_eq!(config.playback.max_seek_attempts, 2);
        assert_eq!(config.playback.seek_retry_delay_ms, 30);
        assert_eq!(config.editor.default_zoom, 20.0);
        assert_eq!(config.logging.level, "info");
    }
}
