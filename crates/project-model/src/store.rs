//! Shared editor state container.
//!
//! The editor state is owned by one [`EditorStore`] that is cloned (by
//! handle) into every component that needs it. Access goes through closures
//! so a lock guard can never be held across an `.await`.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use clipforge_common::EditorDefaults;

use crate::clip::ClipId;
use crate::library::Library;
use crate::timeline::Timeline;

/// Everything a project persists, plus transient selection/playhead state.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub timeline: Timeline,
    pub library: Library,
}

impl EditorState {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_defaults(name, &EditorDefaults::default())
    }

    pub fn with_defaults(name: impl Into<String>, defaults: &EditorDefaults) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            timeline: Timeline::with_defaults(defaults),
            library: Library::new(),
        }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new("Untitled Project")
    }
}

/// Cloneable handle to the single editor state.
#[derive(Debug, Clone, Default)]
pub struct EditorStore {
    inner: Arc<RwLock<EditorState>>,
}

impl EditorStore {
    pub fn new(state: EditorState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&EditorState) -> R) -> R {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut EditorState) -> R) -> R {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn timeline<R>(&self, f: impl FnOnce(&Timeline) -> R) -> R {
        self.read(|s| f(&s.timeline))
    }

    pub fn update_timeline<R>(&self, f: impl FnOnce(&mut Timeline) -> R) -> R {
        self.update(|s| f(&mut s.timeline))
    }

    /// Full copy of the current state.
    pub fn snapshot(&self) -> EditorState {
        self.read(EditorState::clone)
    }

    /// Swap in a whole new state (project load, new project).
    pub fn replace(&self, state: EditorState) {
        self.update(|s| *s = state);
    }

    pub fn playhead(&self) -> f64 {
        self.timeline(Timeline::playhead_position)
    }

    pub fn set_playhead(&self, t: f64) -> f64 {
        self.update_timeline(|tl| tl.set_playhead_position(t))
    }

    pub fn selected_clip_id(&self) -> Option<ClipId> {
        self.timeline(|tl| tl.selected_clip_id().cloned())
    }

    pub fn select_clip(&self, id: Option<ClipId>) -> bool {
        self.update_timeline(|tl| tl.select_clip(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{Clip, TrackId};

    #[test]
    fn test_handles_share_state() {
        let store = EditorStore::new(EditorState::new("Shared"));
        let other = store.clone();

        store.update_timeline(|tl| {
            tl.add_clip(Clip::new(TrackId::new("track-1"), "/a.mp4", 4.0).with_id("a"))
                .unwrap();
        });
        assert_eq!(other.set_playhead(2.5), 2.5);
        assert_eq!(store.playhead(), 2.5);
        assert!(other.select_clip(Some(ClipId::new("a"))));
        assert_eq!(store.selected_clip_id(), Some(ClipId::new("a")));
    }

    #[test]
    fn test_replace() {
        let store = EditorStore::default();
        store.replace(EditorState::new("Fresh"));
        assert_eq!(store.read(|s| s.name.clone()), "Fresh");
        assert_eq!(store.snapshot().timeline.tracks().len(), 1);
    }
}
