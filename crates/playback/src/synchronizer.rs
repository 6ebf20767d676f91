//! Keeps the preview surface in step with the timeline.
//!
//! Loads and seeks are single-flight: each takes its own async lock, so
//! callers queue in FIFO order. Nothing is cancelled outright; instead every
//! operation that starts or stops the transport bumps a generation counter,
//! and async continuations compare the generation they started under before
//! applying any side effect.
//!
//! The only task that is ever aborted is the gap clock, and only while it is
//! still counting.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clipforge_common::{
    within_tolerance, AppConfig, MediaDefaults, PlaybackTuning, Throttle, TransportBus,
    TransportListener, TransportSignal,
};
use clipforge_project_model::{Clip, ClipId, EditorStore, Timeline};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::PlaybackError;
use crate::gate::ResyncGate;
use crate::surface::RenderSurface;

/// Offset from the end of the last clip used by "jump to next" when there is
/// no next clip.
const END_JUMP_BACKOFF_SECS: f64 = 0.1;

/// Max distance between two surface reads for a seek to count as stuck.
const STUCK_SEEK_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Nothing loaded.
    Idle,
    Loading,
    Seeking,
    Playing,
    Paused,
    /// Surface paused between two clips while a software clock moves the playhead.
    GapTraversal,
    /// The user is dragging the playhead.
    Scrubbing,
}

impl PlaybackMode {
    /// Whether the transport is advancing on its own.
    pub fn is_running(self) -> bool {
        matches!(self, PlaybackMode::Playing | PlaybackMode::GapTraversal)
    }
}

/// Everything about a clip that affects what the surface shows for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSignature {
    pub id: ClipId,
    pub file_path: PathBuf,
    pub trim_start: f64,
    pub trim_end: f64,
    pub start_time: f64,
}

impl ClipSignature {
    pub fn of(clip: &Clip) -> Self {
        Self {
            id: clip.id.clone(),
            file_path: clip.file_path.clone(),
            trim_start: clip.trim_start,
            trim_end: clip.trim_end,
            start_time: clip.start_time,
        }
    }
}

#[derive(Debug)]
struct Transport {
    mode: PlaybackMode,
    generation: u64,
    loaded: Option<PathBuf>,
    active_clip: Option<ClipId>,
    cued: Option<ClipSignature>,
    gap_task: Option<JoinHandle<()>>,
    scrub_throttle: Throttle,
    last_error: Option<PlaybackError>,
}

impl Transport {
    fn rest(&mut self) {
        self.mode = if self.loaded.is_some() {
            PlaybackMode::Paused
        } else {
            PlaybackMode::Idle
        };
    }
}

/// Owns one [`RenderSurface`] and drives it from an [`EditorStore`].
pub struct PlaybackSynchronizer {
    store: EditorStore,
    surface: Arc<dyn RenderSurface>,
    tuning: PlaybackTuning,
    media: MediaDefaults,
    load_lock: tokio::sync::Mutex<()>,
    seek_lock: tokio::sync::Mutex<()>,
    resync: ResyncGate,
    transport: Mutex<Transport>,
    epoch: Instant,
}

impl PlaybackSynchronizer {
    pub fn new(store: EditorStore, surface: Arc<dyn RenderSurface>, config: &AppConfig) -> Arc<Self> {
        Arc::new(Self {
            store,
            surface,
            tuning: config.playback.clone(),
            media: config.media.clone(),
            load_lock: tokio::sync::Mutex::new(()),
            seek_lock: tokio::sync::Mutex::new(()),
            resync: ResyncGate::new(),
            transport: Mutex::new(Transport {
                mode: PlaybackMode::Idle,
                generation: 0,
                loaded: None,
                active_clip: None,
                cued: None,
                gap_task: None,
                scrub_throttle: Throttle::new(config.playback.scrub_throttle()),
                last_error: None,
            }),
            epoch: Instant::now(),
        })
    }

    /// Subscribe to scrub signals from the editing surface.
    pub fn attach(self: &Arc<Self>, bus: &TransportBus) {
        bus.subscribe(self);
    }

    // ---- state ----

    pub fn mode(&self) -> PlaybackMode {
        self.transport().mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode().is_running()
    }

    pub fn loaded_source(&self) -> Option<PathBuf> {
        self.transport().loaded.clone()
    }

    /// The clip the surface is currently showing.
    pub fn active_clip(&self) -> Option<ClipId> {
        self.transport().active_clip.clone()
    }

    pub fn last_error(&self) -> Option<PlaybackError> {
        self.transport().last_error.clone()
    }

    pub fn take_error(&self) -> Option<PlaybackError> {
        self.transport().last_error.take()
    }

    /// Whether a scrub-end resync is still outstanding.
    pub fn resync_pending(&self) -> bool {
        self.resync.is_held()
    }

    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        &self.surface
    }

    // ---- surface primitives ----

    /// Show `path` at source time `at`.
    ///
    /// If `path` is already loaded this is a plain [`seek_safely`](Self::seek_safely).
    /// On failure the loaded-source pointer is rolled back.
    pub async fn load_source(&self, path: &Path, at: f64) -> Result<(), PlaybackError> {
        let _loading = self.load_lock.lock().await;

        let Some(previous) = self.claim_source(path) else {
            return self.seek_safely(at).await;
        };

        tracing::debug!(path = %path.display(), at, "Loading source");
        if let Err(e) = self.surface.load(path).await {
            {
                let mut transport = self.transport();
                if transport.loaded.as_deref() == Some(path) {
                    transport.loaded = previous;
                }
                transport.cued = None;
            }
            return Err(PlaybackError::load_failure(
                path,
                self.media.is_recording(path),
                e,
            ));
        }

        self.seek_safely(at).await
    }

    /// Seek the surface to `target` source seconds and confirm it got there.
    ///
    /// Returns at once when the surface is already within tolerance. A seek
    /// that does not move the reported position at all is treated as a
    /// stalled decoder and the surface is reloaded before trying again.
    pub async fn seek_safely(&self, target: f64) -> Result<(), PlaybackError> {
        let _seeking = self.seek_lock.lock().await;
        let tolerance = self.tuning.seek_tolerance_secs;
        let surface = &self.surface;

        if surface.is_ready() && within_tolerance(surface.current_time(), target, tolerance) {
            return Ok(());
        }
        if !surface.is_ready() {
            surface.wait_ready().await?;
        }

        let attempts = self.tuning.max_seek_attempts.max(1);
        for attempt in 1..=attempts {
            let before = surface.current_time();
            surface.set_current_time(target);
            let immediate = surface.current_time();

            if !within_tolerance(immediate, target, tolerance)
                && (immediate - before).abs() < STUCK_SEEK_EPSILON
            {
                tracing::warn!(
                    target_secs = target,
                    current = immediate,
                    attempt,
                    "Seek ignored, reloading surface"
                );
                match tokio::time::timeout(self.tuning.reload_timeout(), surface.reload()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!(error = %e, "Surface reload failed"),
                    Err(_) => tracing::warn!("Surface reload timed out"),
                }
                surface.set_current_time(target);
            }

            match tokio::time::timeout(self.tuning.seek_timeout(), surface.wait_seeked()).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::debug!(target_secs = target, attempt, "No seek completion before timeout")
                }
            }

            if within_tolerance(surface.current_time(), target, tolerance) {
                return Ok(());
            }
            if attempt < attempts {
                tokio::time::sleep(self.tuning.seek_retry_delay()).await;
            }
        }

        let current = surface.current_time();
        tracing::warn!(target_secs = target, current, attempts, "Seek did not settle");
        Err(PlaybackError::SeekTimeout { target, current })
    }

    // ---- transport ----

    /// Start playing from the playhead.
    ///
    /// Waits for an outstanding scrub-end resync first. If the playhead is
    /// not over a clip, playback starts at the next clip after it (or the
    /// first clip) and the playhead jumps there.
    pub async fn play(self: &Arc<Self>) -> Result<(), PlaybackError> {
        if self.is_playing() {
            return Ok(());
        }
        self.resync.wait().await;

        let generation = self.begin(PlaybackMode::Loading);
        let Some((clip, at)) = self.store.timeline(resume_target) else {
            self.settle(generation);
            return Err(PlaybackError::NothingToPlay);
        };

        tracing::info!(clip = %clip.id, at, "Play");
        self.start_clip(generation, clip, at).await
    }

    /// Pause, leaving the playhead where the surface is.
    pub fn pause(&self) {
        let was_playing = self.mode() == PlaybackMode::Playing;
        let active = self.active_clip();
        self.begin(PlaybackMode::Paused);
        self.surface.pause();

        if was_playing {
            let source_time = self.surface.current_time();
            self.store.update_timeline(|tl| {
                if let Some(clip) = active.as_ref().and_then(|id| tl.clip(id)) {
                    let t = source_time.clamp(clip.trim_start, clip.trim_end);
                    tl.set_playhead_position(clip.timeline_time_at(t));
                }
            });
        }
        tracing::debug!(playhead = self.store.playhead(), "Paused");
    }

    /// Pause, rewind the playhead to zero, and cue the first clip.
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        let generation = self.begin(PlaybackMode::Paused);
        self.surface.pause();
        self.store.set_playhead(0.0);

        let first = self
            .store
            .timeline(|tl| tl.clips_in_order().into_iter().next().cloned());
        match first {
            Some(clip) => {
                let at = clip.trim_start;
                self.cue_clip(generation, clip, at).await
            }
            None => Ok(()),
        }
    }

    /// Cue the clip before the selected one, or the selected clip's in-point
    /// if it is already the first.
    pub async fn jump_to_previous_clip(&self) -> Result<(), PlaybackError> {
        let target = self.store.timeline(|tl| {
            let selected = tl.selected_clip()?;
            let clip = tl.previous_clip(&selected.id).unwrap_or(selected);
            Some((clip.clone(), clip.trim_start))
        });
        self.jump(target).await
    }

    /// Cue the clip after the selected one. On the last clip, cue a point just
    /// before its out-point instead.
    pub async fn jump_to_next_clip(&self) -> Result<(), PlaybackError> {
        let target = self.store.timeline(|tl| {
            let selected = tl.selected_clip()?;
            Some(match tl.next_clip(&selected.id) {
                Some(next) => (next.clone(), next.trim_start),
                None => {
                    let at = (selected.trim_end - END_JUMP_BACKOFF_SECS).max(selected.trim_start);
                    (selected.clone(), at)
                }
            })
        });
        self.jump(target).await
    }

    async fn jump(&self, target: Option<(Clip, f64)>) -> Result<(), PlaybackError> {
        let Some((clip, at)) = target else {
            return Ok(());
        };
        let generation = self.begin(PlaybackMode::Paused);
        self.surface.pause();
        self.store.set_playhead(clip.timeline_time_at(at));
        self.cue_clip(generation, clip, at).await
    }

    /// Show the selected clip (or the first clip) at its in-point.
    ///
    /// Does nothing while playing or scrubbing, or when the same clip with the
    /// same trims is already cued.
    pub async fn cue_selected(&self) -> Result<(), PlaybackError> {
        let mode = self.mode();
        if mode.is_running() || mode == PlaybackMode::Scrubbing {
            return Ok(());
        }

        let clip = self.store.timeline(|tl| {
            tl.selected_clip()
                .or_else(|| tl.clips_in_order().into_iter().next())
                .cloned()
        });
        let Some(clip) = clip else {
            self.transport().cued = None;
            return Ok(());
        };

        {
            let transport = self.transport();
            if transport.cued.as_ref() == Some(&ClipSignature::of(&clip))
                && transport.loaded.as_deref() == Some(clip.file_path.as_path())
            {
                return Ok(());
            }
        }

        let generation = self.begin(PlaybackMode::Paused);
        let at = clip.trim_start;
        self.cue_clip(generation, clip, at).await
    }

    /// Point the surface at whatever the playhead is over.
    ///
    /// Holds the resync slot for the duration, so a concurrent
    /// [`play`](Self::play) starts only after this finishes.
    pub async fn resync_to_playhead(&self) -> Result<(), PlaybackError> {
        let _slot = self.resync.reserve();
        let generation = self.transport().generation;
        self.resync_within(generation).await
    }

    /// Preview the playhead position while scrubbing.
    ///
    /// Only moves the surface when the playhead is within the selected,
    /// already loaded clip; seeks are rate limited.
    pub fn follow_playhead(&self) {
        let Some((clip, playhead)) = self
            .store
            .timeline(|tl| Some((tl.selected_clip()?.clone(), tl.playhead_position())))
        else {
            return;
        };
        if playhead < clip.start_time || playhead > clip.end() {
            return;
        }

        let target = clip.source_time_at(playhead);
        if within_tolerance(self.surface.current_time(), target, self.tuning.seek_tolerance_secs) {
            return;
        }

        {
            let mut transport = self.transport();
            if transport.mode != PlaybackMode::Scrubbing
                || transport.loaded.as_deref() != Some(clip.file_path.as_path())
            {
                return;
            }
            if !transport.scrub_throttle.should_fire(self.epoch.elapsed()) {
                return;
            }
        }
        self.surface.set_current_time(target);
    }

    /// React to the surface reporting `source_time` while playing.
    ///
    /// Moves the playhead, and at the active clip's out-point moves on to the
    /// next clip: directly if it abuts, through a timed gap otherwise, or stops
    /// at the end of the timeline.
    pub fn on_time_update(self: &Arc<Self>, source_time: f64) {
        let (generation, active) = {
            let transport = self.transport();
            if transport.mode != PlaybackMode::Playing {
                return;
            }
            (transport.generation, transport.active_clip.clone())
        };
        let Some(active) = active else {
            return;
        };

        let clips = self.store.timeline(|tl| {
            let clip = tl.clip(&active)?.clone();
            Some((clip, tl.next_clip(&active).cloned()))
        });
        let Some((clip, next)) = clips else {
            tracing::debug!(clip = %active, "Active clip removed during playback");
            self.pause();
            return;
        };

        if source_time >= clip.trim_end {
            self.cross_boundary(generation, clip, next);
        } else if source_time < clip.trim_start - self.tuning.seek_tolerance_secs {
            self.surface.set_current_time(clip.trim_start);
        } else {
            self.store.set_playhead(clip.timeline_time_at(source_time));
        }
    }

    /// Poll the surface while playing. Ends once the synchronizer is dropped.
    pub fn spawn_progress_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let period = self.tuning.progress_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(this) = weak.upgrade() else {
                    break;
                };
                if this.mode() == PlaybackMode::Playing {
                    let t = this.surface.current_time();
                    this.on_time_update(t);
                }
            }
        })
    }

    // ---- continuations ----

    fn cross_boundary(self: &Arc<Self>, generation: u64, clip: Clip, next: Option<Clip>) {
        let Some(next) = next else {
            if self.transition(generation, PlaybackMode::Playing, PlaybackMode::Paused) {
                self.begin(PlaybackMode::Paused);
                self.surface.pause();
                self.store.set_playhead(clip.end());
                tracing::info!(playhead = clip.end(), "Reached end of timeline");
            }
            return;
        };

        let gap = next.start_time - clip.end();
        if gap > self.tuning.gap_tolerance_secs {
            if !self.transition(generation, PlaybackMode::Playing, PlaybackMode::GapTraversal) {
                return;
            }
            self.surface.pause();
            self.store.set_playhead(clip.end());
            tracing::debug!(from = %clip.id, to = %next.id, gap, "Traversing gap");

            let this = Arc::clone(self);
            let from = clip.end();
            let mut transport = self.transport();
            if let Some(previous) = transport.gap_task.take() {
                previous.abort();
            }
            transport.gap_task = spawn_detached(this.traverse_gap(generation, from, gap, next));
        } else {
            if !self.transition(generation, PlaybackMode::Playing, PlaybackMode::Loading) {
                return;
            }
            tracing::debug!(from = %clip.id, to = %next.id, "Crossing into next clip");
            let this = Arc::clone(self);
            spawn_detached(async move {
                let at = next.trim_start;
                if let Err(e) = this.start_clip(generation, next, at).await {
                    tracing::debug!(error = %e, "Clip transition failed");
                }
            });
        }
    }

    async fn traverse_gap(self: Arc<Self>, generation: u64, from: f64, gap: f64, next: Clip) {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.tuning.gap_tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if !self.is_current(generation) {
                return;
            }
            let elapsed = started.elapsed().as_secs_f64();
            if elapsed >= gap {
                break;
            }
            self.store.set_playhead(from + elapsed);
        }

        // Past this point the task is no longer abortable.
        {
            let mut transport = self.transport();
            if transport.generation != generation {
                return;
            }
            transport.gap_task = None;
            transport.mode = PlaybackMode::Loading;
        }

        let at = next.trim_start;
        if let Err(e) = self.start_clip(generation, next, at).await {
            tracing::debug!(error = %e, "Gap exit failed");
        }
    }

    async fn resync_within(&self, generation: u64) -> Result<(), PlaybackError> {
        let target = self.store.timeline(|tl| {
            let playhead = tl.playhead_position();
            let clip = tl
                .clip_at(playhead)
                .or_else(|| tl.first_clip_from(playhead))
                .or_else(|| tl.clips_in_order().last().copied())?;
            let offset = (playhead - clip.start_time).clamp(0.0, clip.length());
            Some((clip.clone(), clip.trim_start + offset))
        });
        let Some((clip, at)) = target else {
            return Ok(());
        };
        if !self.is_current(generation) {
            return Ok(());
        }

        tracing::debug!(clip = %clip.id, at, "Resync to playhead");
        self.cue_clip(generation, clip, at).await
    }

    /// Load `clip` at `at` and start the surface.
    async fn start_clip(&self, generation: u64, clip: Clip, at: f64) -> Result<(), PlaybackError> {
        let mode = self.preparing_mode(&clip.file_path);
        if !self.enter(generation, mode) {
            return Ok(());
        }
        self.store.set_playhead(clip.timeline_time_at(at));

        let loaded = self.load_source(&clip.file_path, at).await;
        if !self.is_current(generation) {
            return Ok(());
        }
        if let Err(e) = loaded {
            return Err(self.fail(generation, e));
        }
        self.adopt(&clip);

        if let Err(e) = self.surface.play().await {
            return Err(self.fail(generation, e.into()));
        }
        if !self.enter(generation, PlaybackMode::Playing) && !self.is_playing() {
            self.surface.pause();
        }
        Ok(())
    }

    /// Load `clip` at `at` and leave the surface paused there.
    async fn cue_clip(&self, generation: u64, clip: Clip, at: f64) -> Result<(), PlaybackError> {
        let mode = self.preparing_mode(&clip.file_path);
        if !self.enter(generation, mode) {
            return Ok(());
        }

        let loaded = self.load_source(&clip.file_path, at).await;
        if !self.is_current(generation) {
            return Ok(());
        }
        if let Err(e) = loaded {
            return Err(self.fail(generation, e));
        }
        self.adopt(&clip);
        self.settle(generation);
        Ok(())
    }

    /// Make `clip` the active and selected clip.
    fn adopt(&self, clip: &Clip) {
        self.store.select_clip(Some(clip.id.clone()));
        let mut transport = self.transport();
        transport.active_clip = Some(clip.id.clone());
        transport.cued = Some(ClipSignature::of(clip));
        transport.last_error = None;
    }

    fn fail(&self, generation: u64, err: PlaybackError) -> PlaybackError {
        tracing::error!(error = %err, "Playback stopped");
        let stopped = {
            let mut transport = self.transport();
            if transport.generation == generation {
                transport.rest();
                transport.cued = None;
                transport.last_error = Some(err.clone());
                true
            } else {
                false
            }
        };
        if stopped {
            self.surface.pause();
        }
        err
    }

    // ---- generation bookkeeping ----

    fn transport(&self) -> MutexGuard<'_, Transport> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new generation, invalidating every in-flight continuation and
    /// the gap clock.
    fn begin(&self, mode: PlaybackMode) -> u64 {
        let mut transport = self.transport();
        transport.generation += 1;
        if let Some(task) = transport.gap_task.take() {
            task.abort();
        }
        if mode == PlaybackMode::Paused {
            transport.rest();
        } else {
            transport.mode = mode;
        }
        transport.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.transport().generation == generation
    }

    fn enter(&self, generation: u64, mode: PlaybackMode) -> bool {
        let mut transport = self.transport();
        if transport.generation != generation {
            return false;
        }
        transport.mode = mode;
        true
    }

    fn transition(&self, generation: u64, from: PlaybackMode, to: PlaybackMode) -> bool {
        let mut transport = self.transport();
        if transport.generation != generation || transport.mode != from {
            return false;
        }
        transport.mode = to;
        true
    }

    fn settle(&self, generation: u64) {
        let mut transport = self.transport();
        if transport.generation == generation {
            transport.rest();
        }
    }

    /// Claim the loaded-source pointer for `path`. Returns the previous value,
    /// or `None` when `path` is already loaded.
    fn claim_source(&self, path: &Path) -> Option<Option<PathBuf>> {
        let mut transport = self.transport();
        if transport.loaded.as_deref() == Some(path) {
            return None;
        }
        Some(transport.loaded.replace(path.to_path_buf()))
    }

    fn preparing_mode(&self, path: &Path) -> PlaybackMode {
        if self.transport().loaded.as_deref() == Some(path) {
            PlaybackMode::Seeking
        } else {
            PlaybackMode::Loading
        }
    }

    fn begin_scrub(&self) {
        self.begin(PlaybackMode::Scrubbing);
        self.surface.pause();
        self.transport().scrub_throttle.reset();
        tracing::debug!("Scrubbing started");
    }

    /// Resync to the released playhead. A transport command issued during
    /// the drag owns the surface by now, so release is a no-op then.
    fn end_scrub(self: &Arc<Self>) {
        let (slot, generation) = {
            let mut transport = self.transport();
            if transport.mode != PlaybackMode::Scrubbing {
                tracing::debug!(mode = ?transport.mode, "Scrub released after transport took over");
                return;
            }
            transport.rest();
            (self.resync.reserve(), transport.generation)
        };

        let this = Arc::clone(self);
        spawn_detached(async move {
            let _slot = slot;
            if let Err(e) = this.resync_within(generation).await {
                tracing::warn!(error = %e, "Resync after scrubbing failed");
            }
        });
    }
}

impl TransportListener for PlaybackSynchronizer {
    fn on_transport_signal(self: Arc<Self>, signal: TransportSignal) {
        match signal {
            TransportSignal::PausePlayback => self.begin_scrub(),
            TransportSignal::PlayheadScrubbed => self.follow_playhead(),
            TransportSignal::ScrubbingEnd => self.end_scrub(),
        }
    }
}

impl std::fmt::Debug for PlaybackSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSynchronizer")
            .field("transport", &*self.transport())
            .field("resync_pending", &self.resync.is_held())
            .finish()
    }
}

/// Clip and source time playback resumes from.
fn resume_target(tl: &Timeline) -> Option<(Clip, f64)> {
    let playhead = tl.playhead_position();
    if let Some(clip) = tl.clip_at(playhead) {
        return Some((clip.clone(), clip.source_time_at(playhead)));
    }
    let clip = tl
        .first_clip_from(playhead)
        .or_else(|| tl.clips_in_order().into_iter().next())?;
    Some((clip.clone(), clip.trim_start))
}

fn spawn_detached<F>(task: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(task)),
        Err(_) => {
            tracing::warn!("No async runtime, playback continuation dropped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_project_model::TrackId;

    fn timeline_with(clips: &[(f64, f64, f64)]) -> Timeline {
        let mut tl = Timeline::new();
        for (i, &(start, trim_start, trim_end)) in clips.iter().enumerate() {
            let clip = Clip::new(TrackId::new("track-1"), format!("/v/{i}.mp4"), 20.0)
                .with_id(format!("c{i}"))
                .with_trim(trim_start, trim_end)
                .at(start);
            tl.add_clip(clip).unwrap();
        }
        tl
    }

    #[test]
    fn test_resume_target_inside_clip() {
        let mut tl = timeline_with(&[(0.0, 2.0, 6.0), (6.0, 0.0, 3.0)]);
        tl.set_playhead_position(1.5);
        let (clip, at) = resume_target(&tl).unwrap();
        assert_eq!(clip.id.as_str(), "c0");
        assert_eq!(at, 3.5);
    }

    #[test]
    fn test_resume_target_in_gap_and_past_end() {
        let mut tl = timeline_with(&[(0.0, 0.0, 2.0), (5.0, 1.0, 3.0)]);
        tl.set_playhead_position(3.0);
        let (clip, at) = resume_target(&tl).unwrap();
        assert_eq!((clip.id.as_str(), at), ("c1", 1.0));

        tl.set_playhead_position(7.0);
        let (clip, _) = resume_target(&tl).unwrap();
        assert_eq!(clip.id.as_str(), "c0");

        assert!(resume_target(&Timeline::new()).is_none());
    }

    #[test]
    fn test_signature_tracks_trim_changes() {
        let tl = timeline_with(&[(0.0, 0.0, 4.0)]);
        let clip = tl.clips().next().unwrap().clone();
        let before = ClipSignature::of(&clip);
        let trimmed = clip.with_trim(0.5, 4.0);
        assert_ne!(before, ClipSignature::of(&trimmed));
    }

    #[test]
    fn test_mode_running() {
        assert!(PlaybackMode::Playing.is_running());
        assert!(PlaybackMode::GapTraversal.is_running());
        assert!(!PlaybackMode::Scrubbing.is_running());
    }
}
