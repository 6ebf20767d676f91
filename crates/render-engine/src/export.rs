//! Export requests, progress reporting, and the ffmpeg backend.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use clipforge_common::{ClipforgeError, ClipforgeResult, ExportDefaults};
use clipforge_project_model::{Timeline, VideoMetadata};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Fallback frame size when the source resolution is unknown.
const DEFAULT_SIZE: (u32, u32) = (1920, 1080);

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportResolution {
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Hd1080,
    /// Keep the source resolution. Multi-clip exports use the first clip's.
    #[default]
    #[serde(rename = "source")]
    Source,
}

impl ExportResolution {
    pub fn height(self) -> Option<u32> {
        match self {
            ExportResolution::Hd720 => Some(720),
            ExportResolution::Hd1080 => Some(1080),
            ExportResolution::Source => None,
        }
    }

    /// Common frame size every clip is scaled and padded to.
    pub fn frame_size(self, first: Option<&VideoMetadata>) -> (u32, u32) {
        match self {
            ExportResolution::Hd720 => (1280, 720),
            ExportResolution::Hd1080 => (1920, 1080),
            ExportResolution::Source => first
                .filter(|m| m.width > 0 && m.height > 0)
                .map(|m| (m.width, m.height))
                .unwrap_or(DEFAULT_SIZE),
        }
    }
}

impl fmt::Display for ExportResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportResolution::Hd720 => "720p",
            ExportResolution::Hd1080 => "1080p",
            ExportResolution::Source => "source",
        })
    }
}

impl FromStr for ExportResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "720p" | "720" => Ok(ExportResolution::Hd720),
            "1080p" | "1080" => Ok(ExportResolution::Hd1080),
            "source" => Ok(ExportResolution::Source),
            other => Err(format!("unknown resolution '{other}' (expected 720p, 1080p or source)")),
        }
    }
}

/// One trimmed source range, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSegment {
    pub source_path: PathBuf,
    pub trim_start: f64,
    pub trim_end: f64,
    pub metadata: Option<VideoMetadata>,
}

impl ExportSegment {
    pub fn length(&self) -> f64 {
        (self.trim_end - self.trim_start).max(0.0)
    }
}

/// Everything needed to render one output file.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub segments: Vec<ExportSegment>,
    pub resolution: ExportResolution,
    pub output_path: PathBuf,
    pub settings: ExportDefaults,
}

impl ExportRequest {
    /// Collect every clip on every track, ordered by start time.
    pub fn from_timeline(
        timeline: &Timeline,
        resolution: ExportResolution,
        output_path: impl Into<PathBuf>,
        settings: ExportDefaults,
    ) -> Result<Self, ExportError> {
        let segments: Vec<ExportSegment> = timeline
            .clips_in_order()
            .into_iter()
            .map(|clip| ExportSegment {
                source_path: clip.file_path.clone(),
                trim_start: clip.trim_start,
                trim_end: clip.trim_end,
                metadata: clip.metadata.clone(),
            })
            .collect();

        if segments.is_empty() {
            return Err(ExportError::NoClips);
        }

        Ok(Self {
            segments,
            resolution,
            output_path: output_path.into(),
            settings,
        })
    }

    /// Output length in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(ExportSegment::length).sum()
    }
}

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Overall progress in percent, `[0, 100]`.
    pub percent: f64,

    /// Zero-based index of the clip being processed, during per-clip steps.
    pub current_clip: Option<usize>,

    pub total_clips: usize,

    pub stage: ExportStage,
}

/// Stages of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    /// Trimming and normalizing individual clips.
    Processing,
    /// Joining normalized clips into the output.
    Concatenating,
    /// Single-clip encode.
    Encoding,
    Complete,
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No clips to export")]
    NoClips,

    #[error("{backend} is not available")]
    BackendUnavailable { backend: String },

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{step} failed ({status}): {stderr}")]
    Ffmpeg {
        step: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ExportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<ExportError> for ClipforgeError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::BackendUnavailable { backend } => {
                ClipforgeError::unsupported(format!("{backend} not found in PATH"))
            }
            other => ClipforgeError::export(other.to_string()),
        }
    }
}

/// Something that can render an [`ExportRequest`].
#[async_trait]
pub trait ExportBackend: Send + Sync {
    async fn export(
        &self,
        request: &ExportRequest,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), ExportError>;

    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}

/// Export the request with the default ffmpeg backend.
///
/// This is the main entry point for rendering.
pub async fn export_timeline(
    request: ExportRequest,
    progress: Option<ProgressCallback>,
) -> ClipforgeResult<PathBuf> {
    export_with(&FfmpegExporter::new(), request, progress).await
}

/// Export the request with a specific backend.
pub async fn export_with(
    backend: &dyn ExportBackend,
    request: ExportRequest,
    progress: Option<ProgressCallback>,
) -> ClipforgeResult<PathBuf> {
    tracing::info!(
        output = %request.output_path.display(),
        clips = request.segments.len(),
        duration_secs = request.total_duration(),
        resolution = %request.resolution,
        "Starting export"
    );

    if request.segments.is_empty() {
        return Err(ExportError::NoClips.into());
    }
    if !backend.is_available() {
        return Err(ExportError::BackendUnavailable {
            backend: backend.name().to_string(),
        }
        .into());
    }

    if let Some(parent) = request.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    if let Some(cb) = &progress {
        cb(ExportProgress {
            percent: 0.0,
            current_clip: None,
            total_clips: request.segments.len(),
            stage: ExportStage::Preparing,
        });
    }

    let started = tokio::time::Instant::now();
    backend.export(&request, progress.as_ref()).await?;

    if let Some(cb) = &progress {
        cb(ExportProgress {
            percent: 100.0,
            current_clip: None,
            total_clips: request.segments.len(),
            stage: ExportStage::Complete,
        });
    }
    tracing::info!(
        backend = backend.name(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Export finished"
    );
    Ok(request.output_path)
}

/// Export backend driving the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegExporter {
    binary: String,
}

impl Default for FfmpegExporter {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegExporter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn export_single(
        &self,
        request: &ExportRequest,
        segment: &ExportSegment,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), ExportError> {
        let args = single_clip_args(segment, request.resolution, &request.settings, &request.output_path);
        let total = request.total_duration();

        self.run("encode", &args, |out_secs| {
            if let Some(cb) = progress {
                cb(ExportProgress {
                    percent: span_percent(out_secs, total, 0.0, 100.0),
                    current_clip: Some(0),
                    total_clips: 1,
                    stage: ExportStage::Encoding,
                });
            }
        })
        .await
    }

    async fn export_many(
        &self,
        request: &ExportRequest,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), ExportError> {
        let work_dir = std::env::temp_dir().join(format!("clipforge-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(|e| ExportError::io(&work_dir, e))?;

        let result = self.normalize_and_concat(request, &work_dir, progress).await;

        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            tracing::warn!(path = %work_dir.display(), error = %e, "Failed to remove export temp dir");
        }
        result
    }

    async fn normalize_and_concat(
        &self,
        request: &ExportRequest,
        work_dir: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), ExportError> {
        let total_clips = request.segments.len();
        let size = request
            .resolution
            .frame_size(request.segments[0].metadata.as_ref());
        tracing::debug!(width = size.0, height = size.1, clips = total_clips, "Normalizing clips");

        let mut intermediates = Vec::with_capacity(total_clips);
        for (index, segment) in request.segments.iter().enumerate() {
            let out = work_dir.join(format!("clip_{index}.mp4"));
            let args = normalize_args(segment, size, &request.settings, &out);
            self.run(&format!("clip {}", index + 1), &args, |_| {}).await?;
            intermediates.push(out);

            if let Some(cb) = progress {
                cb(ExportProgress {
                    percent: (index + 1) as f64 / total_clips as f64 * 50.0,
                    current_clip: Some(index),
                    total_clips,
                    stage: ExportStage::Processing,
                });
            }
        }

        let list_path = work_dir.join("concat_list.txt");
        tokio::fs::write(&list_path, concat_list(&intermediates))
            .await
            .map_err(|e| ExportError::io(&list_path, e))?;

        let args = concat_args(&list_path, &request.settings, &request.output_path);
        let total = request.total_duration();
        self.run("concat", &args, |out_secs| {
            if let Some(cb) = progress {
                cb(ExportProgress {
                    percent: span_percent(out_secs, total, 50.0, 50.0),
                    current_clip: None,
                    total_clips,
                    stage: ExportStage::Concatenating,
                });
            }
        })
        .await
    }

    /// Run ffmpeg with `-progress pipe:1`, reporting encoded output seconds.
    async fn run(
        &self,
        step: &str,
        args: &[String],
        mut on_progress: impl FnMut(f64),
    ) -> Result<(), ExportError> {
        tracing::debug!(step, args = ?args, "Running ffmpeg");
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExportError::Spawn {
                tool: self.binary.clone(),
                source: e,
            })?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            if let Some(mut stderr) = stderr {
                if let Err(err) = stderr.read_to_string(&mut output).await {
                    output = format!("<failed to read ffmpeg stderr: {err}>");
                }
            }
            output
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            let mut state = ProgressState::default();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some((key, value)) = line.trim().split_once('=') {
                    state.update(key, value);
                    if key == "progress" {
                        on_progress(state.out_time_secs);
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|e| ExportError::Spawn {
            tool: self.binary.clone(),
            source: e,
        })?;
        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ExportError::Ffmpeg {
                step: step.to_string(),
                status: status.to_string(),
                stderr: last_lines(&stderr_output, 5),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ExportBackend for FfmpegExporter {
    async fn export(
        &self,
        request: &ExportRequest,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), ExportError> {
        match request.segments.as_slice() {
            [] => Err(ExportError::NoClips),
            [only] => self.export_single(request, only, progress).await,
            _ => self.export_many(request, progress).await,
        }
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
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

fn encoder_args(settings: &ExportDefaults) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-crf".to_string(),
        settings.crf.to_string(),
    ]
}

fn trimmed_input_args(segment: &ExportSegment) -> Vec<String> {
    vec![
        "-ss".to_string(),
        format!("{:.3}", segment.trim_start),
        "-t".to_string(),
        format!("{:.3}", segment.length()),
        "-i".to_string(),
        segment.source_path.to_string_lossy().into_owned(),
    ]
}

fn progress_args() -> [String; 3] {
    ["-progress".to_string(), "pipe:1".to_string(), "-nostats".to_string()]
}

/// Trim one clip straight to the output, optionally scaled to a fixed height.
pub fn single_clip_args(
    segment: &ExportSegment,
    resolution: ExportResolution,
    settings: &ExportDefaults,
    output: &Path,
) -> Vec<String> {
    let mut args = vec!["-y".to_string()];
    args.extend(trimmed_input_args(segment));
    if let Some(height) = resolution.height() {
        args.push("-vf".to_string());
        args.push(format!("scale=-2:{height}"));
    }
    args.extend(encoder_args(settings));
    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args.extend(progress_args());
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Trim one clip and letterbox it into `size`.
pub fn normalize_args(
    segment: &ExportSegment,
    (width, height): (u32, u32),
    settings: &ExportDefaults,
    output: &Path,
) -> Vec<String> {
    let mut args = vec!["-y".to_string()];
    args.extend(trimmed_input_args(segment));
    args.push("-vf".to_string());
    args.push(format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:black"
    ));
    args.extend(encoder_args(settings));
    args.extend(progress_args());
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Join normalized clips listed in `list`.
pub fn concat_args(list: &Path, settings: &ExportDefaults, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list.to_string_lossy().into_owned(),
    ];
    args.extend(encoder_args(settings));
    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args.extend(progress_args());
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Contents of an ffmpeg concat demuxer list.
pub fn concat_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| format!("file '{}'", f.to_string_lossy().replace('\'', r"'\''")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Map `out_secs` of `total_secs` onto `[base, base + span]` percent.
fn span_percent(out_secs: f64, total_secs: f64, base: f64, span: f64) -> f64 {
    if total_secs <= 0.0 {
        return base;
    }
    base + (out_secs / total_secs).clamp(0.0, 1.0) * span
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}
