//! Source probing via ffprobe/ffmpeg.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use clipforge_project_model::{Thumbnail, VideoMetadata};
use serde::Deserialize;
use tokio::process::Command;

use crate::error::MetadataExtractionError;

/// Duration and stream properties of a source.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    /// Seconds; may be non-finite or zero for broken files, the resolver rejects those.
    pub duration: f64,
    pub metadata: VideoMetadata,
}

/// Reads properties of source files.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeInfo, MetadataExtractionError>;

    /// Grab a single JPEG frame at `at` seconds.
    async fn thumbnail(&self, path: &Path, at: f64) -> Result<Thumbnail, MetadataExtractionError>;

    fn name(&self) -> &str;
}

/// Probe backed by the ffprobe and ffmpeg binaries.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    ffprobe: String,
    ffmpeg: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both binaries are on `PATH`.
    pub fn is_available(&self) -> bool {
        command_exists(&self.ffprobe) && command_exists(&self.ffmpeg)
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<ProbeInfo, MetadataExtractionError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(&self.ffprobe, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MetadataExtractionError::unreadable(
                path,
                stderr.lines().last().unwrap_or("ffprobe failed").trim(),
            ));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&raw).map_err(|message| MetadataExtractionError::unreadable(path, message))
    }

    async fn thumbnail(&self, path: &Path, at: f64) -> Result<Thumbnail, MetadataExtractionError> {
        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-ss"])
            .arg(format!("{at:.3}"))
            .arg("-i")
            .arg(path)
            .args([
                "-frames:v",
                "1",
                "-q:v",
                "5",
                "-f",
                "image2pipe",
                "-vcodec",
                "mjpeg",
                "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(&self.ffmpeg, e))?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(MetadataExtractionError::unreadable(
                path,
                format!("no frame at {at:.3}s"),
            ));
        }
        Ok(Thumbnail::from_jpeg(output.stdout))
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

fn spawn_error(tool: &str, err: std::io::Error) -> MetadataExtractionError {
    MetadataExtractionError::ToolUnavailable {
        tool: tool.to_string(),
        message: err.to_string(),
    }
}

fn command_exists(binary: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    bit_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

/// Turn ffprobe's JSON into [`ProbeInfo`]. A missing duration becomes NaN.
pub(crate) fn parse_probe_output(raw: &str) -> Result<ProbeInfo, String> {
    let parsed: FfprobeOutput =
        serde_json::from_str(raw).map_err(|e| format!("unexpected ffprobe output: {e}"))?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "no video stream".to_string())?;

    let duration = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(f64::NAN);

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(30.0);

    let bitrate = stream
        .bit_rate
        .as_deref()
        .or(parsed.format.as_ref().and_then(|f| f.bit_rate.as_deref()))
        .and_then(|b| b.parse::<u64>().ok());

    Ok(ProbeInfo {
        duration,
        metadata: VideoMetadata {
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
            codec: stream.codec_name.unwrap_or_default(),
            frame_rate,
            bitrate,
        },
    })
}

/// Parse `30000/1001` or `25` style rates. Zero or garbage yields `None`.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let rate = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [{
            "index": 0,
            "codec_name": "h264",
            "width": 1920,
            "height": 1080,
            "r_frame_rate": "30/1",
            "avg_frame_rate": "30000/1001",
            "bit_rate": "4500000"
        }],
        "format": {"duration": "12.480000", "bit_rate": "4700000"}
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output(SAMPLE).unwrap();
        assert_eq!(info.duration, 12.48);
        assert_eq!(info.metadata.width, 1920);
        assert_eq!(info.metadata.codec, "h264");
        assert!((info.metadata.frame_rate - 29.97).abs() < 0.01);
        assert_eq!(info.metadata.bitrate, Some(4_500_000));
    }

    #[test]
    fn test_missing_duration_is_nan() {
        let raw = r#"{"streams": [{"width": 640, "height": 480, "avg_frame_rate": "0/0"}], "format": {}}"#;
        let info = parse_probe_output(raw).unwrap();
        assert!(info.duration.is_nan());
        assert_eq!(info.metadata.frame_rate, 30.0);
    }

    #[test]
    fn test_no_video_stream() {
        assert!(parse_probe_output(r#"{"streams": [], "format": {"duration": "3"}}"#).is_err());
        assert!(parse_probe_output("garbage").is_err());
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("60/1"), Some(60.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }
}
