#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clipforge_common::AppConfig;
use clipforge_playback::{PlaybackSynchronizer, RenderSurface, SurfaceError};
use clipforge_project_model::{Clip, EditorState, EditorStore, Timeline, TrackId};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Load(PathBuf),
    Seek(f64),
    Reload,
    Play,
    Pause,
}

#[derive(Debug, Default)]
struct FakeState {
    source: Option<PathBuf>,
    time: f64,
    paused: bool,
    events: Vec<(Instant, Event)>,
}

/// Surface whose clock only moves when the test says so.
#[derive(Debug, Default)]
pub struct FakeSurface {
    state: Mutex<FakeState>,
    broken: Mutex<HashSet<PathBuf>>,
    /// Number of upcoming seek requests to ignore.
    pub ignored_seeks: Mutex<usize>,
    /// Where seeks land relative to the request.
    pub seek_drift: Mutex<f64>,
    /// Never report seek completion.
    pub never_settles: Mutex<bool>,
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                paused: true,
                ..FakeState::default()
            }),
            ..Self::default()
        })
    }

    pub fn break_source(&self, path: impl Into<PathBuf>) {
        self.broken.lock().unwrap().insert(path.into());
    }

    /// Pretend the decoder advanced to `t`.
    pub fn set_time(&self, t: f64) {
        self.state.lock().unwrap().time = t;
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn timed_events(&self) -> Vec<(Instant, Event)> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Load(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.state.lock().unwrap().events.clear();
    }

    fn record(&self, event: Event) {
        self.state.lock().unwrap().events.push((Instant::now(), event));
    }
}

#[async_trait]
impl RenderSurface for FakeSurface {
    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().time
    }

    fn set_current_time(&self, seconds: f64) {
        {
            let mut ignored = self.ignored_seeks.lock().unwrap();
            if *ignored > 0 {
                *ignored -= 1;
                return;
            }
        }
        let drift = *self.seek_drift.lock().unwrap();
        self.state.lock().unwrap().time = seconds + drift;
        self.record(Event::Seek(seconds));
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn pause(&self) {
        self.state.lock().unwrap().paused = true;
        self.record(Event::Pause);
    }

    fn is_ready(&self) -> bool {
        self.state.lock().unwrap().source.is_some()
    }

    async fn play(&self) -> Result<(), SurfaceError> {
        if !self.is_ready() {
            return Err(SurfaceError::NoSource);
        }
        self.state.lock().unwrap().paused = false;
        self.record(Event::Play);
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<(), SurfaceError> {
        self.record(Event::Load(path.to_path_buf()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let broken = self.broken.lock().unwrap().contains(path);
        let mut state = self.state.lock().unwrap();
        state.time = 0.0;
        state.paused = true;
        if broken {
            state.source = None;
            return Err(SurfaceError::Decode {
                path: path.to_path_buf(),
                message: "no such file".into(),
            });
        }
        state.source = Some(path.to_path_buf());
        Ok(())
    }

    async fn reload(&self) -> Result<(), SurfaceError> {
        self.record(Event::Reload);
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
        if *self.never_settles.lock().unwrap() {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// `(path, start, trim_start, trim_end)` per clip, all on the default track.
pub fn store_with(clips: &[(&str, f64, f64, f64)]) -> EditorStore {
    let mut timeline = Timeline::new();
    for (i, &(path, start, trim_start, trim_end)) in clips.iter().enumerate() {
        let clip = Clip::new(TrackId::new("track-1"), path, 60.0)
            .with_id(format!("clip-{i}"))
            .with_trim(trim_start, trim_end)
            .at(start);
        timeline.add_clip(clip).unwrap();
    }
    let mut state = EditorState::new("playback test");
    state.timeline = timeline;
    EditorStore::new(state)
}

pub fn synchronizer(store: &EditorStore, surface: &Arc<FakeSurface>) -> Arc<PlaybackSynchronizer> {
    PlaybackSynchronizer::new(store.clone(), surface.clone(), &AppConfig::default())
}

/// Let spawned continuations run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
