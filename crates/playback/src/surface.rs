//! The rendering surface seam.
//!
//! A surface decodes one source at a time and reports its position in
//! source seconds. Position reads and seek requests are synchronous; loading,
//! starting playback, and seek completion are awaited.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::SurfaceError;

#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Current position in source seconds.
    fn current_time(&self) -> f64;

    /// Request a seek. The reported position may change immediately; the
    /// seek is complete once [`wait_seeked`](Self::wait_seeked) resolves.
    fn set_current_time(&self, seconds: f64);

    fn is_paused(&self) -> bool;

    fn pause(&self);

    /// Whether a source is loaded far enough to accept seeks.
    fn is_ready(&self) -> bool;

    async fn play(&self) -> Result<(), SurfaceError>;

    /// Replace the current source. Resolves once the first frame is decodable.
    async fn load(&self, path: &Path) -> Result<(), SurfaceError>;

    /// Reload the current source in place to recover a stalled decoder.
    async fn reload(&self) -> Result<(), SurfaceError>;

    async fn wait_ready(&self) -> Result<(), SurfaceError>;

    /// Resolves when the last requested seek has been applied, or right away
    /// if none is pending.
    async fn wait_seeked(&self) -> Result<(), SurfaceError>;
}

/// Headless surface that "decodes" registered sources under tokio time.
///
/// Sources are registered with their duration; loading anything else fails
/// the way a missing file would. Position advances with the tokio clock
/// while playing and stops at the end of the source.
#[derive(Debug)]
pub struct SimulatedSurface {
    sources: Mutex<HashMap<PathBuf, f64>>,
    state: Mutex<SimState>,
    load_latency: Duration,
    seek_latency: Duration,
}

#[derive(Debug, Default)]
struct SimState {
    source: Option<PathBuf>,
    duration: f64,
    position: f64,
    /// Set while playing: position is `position + (now - anchor)`.
    anchor: Option<Instant>,
}

impl SimState {
    fn now_position(&self) -> f64 {
        let elapsed = self
            .anchor
            .map(|a| a.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.position + elapsed).min(self.duration)
    }
}

impl Default for SimulatedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSurface {
    pub fn new() -> Self {
        Self {
            sources: Mutex::new(HashMap::new()),
            state: Mutex::new(SimState::default()),
            load_latency: Duration::from_millis(40),
            seek_latency: Duration::from_millis(5),
        }
    }

    pub fn with_latency(mut self, load: Duration, seek: Duration) -> Self {
        self.load_latency = load;
        self.seek_latency = seek;
        self
    }

    /// Make `path` decodable with the given duration.
    pub fn register(&self, path: impl Into<PathBuf>, duration: f64) {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), duration.max(0.0));
    }

    pub fn loaded_source(&self) -> Option<PathBuf> {
        self.state().source.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RenderSurface for SimulatedSurface {
    fn current_time(&self) -> f64 {
        self.state().now_position()
    }

    fn set_current_time(&self, seconds: f64) {
        let mut state = self.state();
        if state.source.is_none() {
            return;
        }
        state.position = seconds.clamp(0.0, state.duration);
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
    }

    fn is_paused(&self) -> bool {
        self.state().anchor.is_none()
    }

    fn pause(&self) {
        let mut state = self.state();
        state.position = state.now_position();
        state.anchor = None;
    }

    fn is_ready(&self) -> bool {
        self.state().source.is_some()
    }

    async fn play(&self) -> Result<(), SurfaceError> {
        let mut state = self.state();
        if state.source.is_none() {
            return Err(SurfaceError::NoSource);
        }
        if state.anchor.is_none() {
            state.anchor = Some(Instant::now());
        }
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<(), SurfaceError> {
        self.pause();
        tokio::time::sleep(self.load_latency).await;

        let duration = self
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied();

        let mut state = self.state();
        match duration {
            Some(duration) => {
                *state = SimState {
                    source: Some(path.to_path_buf()),
                    duration,
                    position: 0.0,
                    anchor: None,
                };
                tracing::trace!(path = %path.display(), duration, "Simulated source loaded");
                Ok(())
            }
            None => {
                *state = SimState::default();
                Err(SurfaceError::Decode {
                    path: path.to_path_buf(),
                    message: "source not found".to_string(),
                })
            }
        }
    }

    async fn reload(&self) -> Result<(), SurfaceError> {
        let source = self.state().source.clone().ok_or(SurfaceError::NoSource)?;
        let position = self.current_time();
        self.load(&source).await?;
        self.set_current_time(position);
        Ok(())
    }

    async fn wait_ready(&self) -> Result<(), SurfaceError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(SurfaceError::NoSource)
        }
    }

    async fn wait_seeked(&self) -> Result<(), SurfaceError> {
        if !self.is_ready() {
            return Err(SurfaceError::NoSource);
        }
        tokio::time::sleep(self.seek_latency).await;
        Ok(())
    }
}
