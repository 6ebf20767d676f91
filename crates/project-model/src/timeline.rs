//! Timeline: tracks of clips, the playhead, zoom, and selection.
//!
//! Every mutation either leaves the timeline in a consistent state or does
//! nothing. Overlap and minimum-length rules are enforced by the edit layer,
//! not here; this type is a thin reducer over the data.

use clipforge_common::EditorDefaults;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clip::{Clip, ClipId, ClipUpdate, TrackId};
use crate::library::LibraryItem;

/// Timeline mutation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("Unknown track: {id}")]
    UnknownTrack { id: TrackId },

    #[error("Track already exists: {id}")]
    DuplicateTrack { id: TrackId },

    #[error("Clip already exists: {id}")]
    DuplicateClip { id: ClipId },
}

/// A lane of clips. Clips keep insertion order, not time order.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub clips: Vec<Clip>,
    pub is_visible: bool,
    pub is_muted: bool,
}

impl Track {
    pub fn new(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            clips: Vec::new(),
            is_visible: true,
            is_muted: false,
        }
    }

    pub fn clip(&self, id: &ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| &c.id == id)
    }

    /// End time of the last clip on this track, or 0 when empty.
    pub fn end(&self) -> f64 {
        self.clips.iter().map(Clip::end).fold(0.0, f64::max)
    }

    /// Clips sorted by start time.
    pub fn clips_by_start(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.iter().collect();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }
}

/// Pixels-per-second bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn from_defaults(defaults: &EditorDefaults) -> Self {
        Self {
            min: defaults.min_zoom,
            max: defaults.max_zoom.max(defaults.min_zoom),
        }
    }

    pub fn clamp(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min;
        }
        zoom.clamp(self.min, self.max)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self::from_defaults(&EditorDefaults::default())
    }
}

pub const DEFAULT_TRACK_ID: &str = "track-1";

/// The editing aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    tracks: Vec<Track>,
    playhead_position: f64,
    selected_clip_id: Option<ClipId>,
    zoom: f64,
    duration: f64,
    zoom_range: ZoomRange,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// An empty timeline with one default video track.
    pub fn new() -> Self {
        Self::with_defaults(&EditorDefaults::default())
    }

    pub fn with_defaults(defaults: &EditorDefaults) -> Self {
        let zoom_range = ZoomRange::from_defaults(defaults);
        Self {
            tracks: vec![Track::new(
                TrackId::new(DEFAULT_TRACK_ID),
                "Video Track 1",
            )],
            playhead_position: 0.0,
            selected_clip_id: None,
            zoom: zoom_range.clamp(defaults.default_zoom),
            duration: 0.0,
            zoom_range,
        }
    }

    /// Assemble a timeline from parts, restoring invariants: duration covers
    /// every clip, playhead and zoom are clamped, dangling selection is dropped.
    pub fn from_parts(
        tracks: Vec<Track>,
        playhead_position: f64,
        zoom: f64,
        duration: f64,
        zoom_range: ZoomRange,
    ) -> Self {
        let mut timeline = Self {
            tracks,
            playhead_position: 0.0,
            selected_clip_id: None,
            zoom: zoom_range.clamp(zoom),
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            zoom_range,
        };
        let covering = timeline.content_end();
        timeline.duration = timeline.duration.max(covering);
        timeline.set_playhead_position(playhead_position);
        timeline
    }

    // ---- accessors ----

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn playhead_position(&self) -> f64 {
        self.playhead_position
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_range(&self) -> ZoomRange {
        self.zoom_range
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn selected_clip_id(&self) -> Option<&ClipId> {
        self.selected_clip_id.as_ref()
    }

    pub fn selected_clip(&self) -> Option<&Clip> {
        self.selected_clip_id.as_ref().and_then(|id| self.clip(id))
    }

    pub fn clip(&self, id: &ClipId) -> Option<&Clip> {
        self.clips().find(|c| &c.id == id)
    }

    /// All clips, track by track, in insertion order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clip_count() == 0
    }

    pub fn track_of(&self, clip_id: &ClipId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.clip(clip_id).is_some())
    }

    /// Every clip across all tracks, sorted by start time (stable).
    pub fn clips_in_order(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips().collect();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }

    /// The first clip (in timeline order) whose span contains `t`.
    pub fn clip_at(&self, t: f64) -> Option<&Clip> {
        self.clips_in_order().into_iter().find(|c| c.contains(t))
    }

    /// The first clip starting at or after `t`.
    pub fn first_clip_from(&self, t: f64) -> Option<&Clip> {
        self.clips_in_order()
            .into_iter()
            .find(|c| c.start_time >= t)
    }

    /// The clip following `id` in timeline order.
    pub fn next_clip(&self, id: &ClipId) -> Option<&Clip> {
        let ordered = self.clips_in_order();
        let index = ordered.iter().position(|c| &c.id == id)?;
        ordered.get(index + 1).copied()
    }

    /// The clip preceding `id` in timeline order.
    pub fn previous_clip(&self, id: &ClipId) -> Option<&Clip> {
        let ordered = self.clips_in_order();
        let index = ordered.iter().position(|c| &c.id == id)?;
        index.checked_sub(1).and_then(|i| ordered.get(i).copied())
    }

    /// End time of the last clip anywhere on the timeline.
    pub fn content_end(&self) -> f64 {
        self.tracks.iter().map(Track::end).fold(0.0, f64::max)
    }

    pub fn track_end(&self, id: &TrackId) -> Option<f64> {
        self.track(id).map(Track::end)
    }

    // ---- mutations ----

    /// Append `clip` to its track. The track must already exist.
    pub fn add_clip(&mut self, clip: Clip) -> Result<(), TimelineError> {
        if self.clip(&clip.id).is_some() {
            return Err(TimelineError::DuplicateClip { id: clip.id });
        }
        let end = clip.end();
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == clip.track_id)
            .ok_or_else(|| TimelineError::UnknownTrack {
                id: clip.track_id.clone(),
            })?;

        tracing::debug!(clip = %clip.id, track = %track.id, start = clip.start_time, "Clip added");
        track.clips.push(clip);
        self.duration = self.duration.max(end);
        Ok(())
    }

    /// Place a library source at the end of a track, spanning its full duration.
    pub fn append_source(
        &mut self,
        track_id: &TrackId,
        item: &LibraryItem,
    ) -> Result<ClipId, TimelineError> {
        let start = self
            .track_end(track_id)
            .ok_or_else(|| TimelineError::UnknownTrack {
                id: track_id.clone(),
            })?;

        let mut clip = Clip::new(track_id.clone(), item.file_path.clone(), item.duration).at(start);
        clip.name = item.name.clone();
        clip.thumbnail = item.thumbnail.clone();
        clip.metadata = item.metadata.clone();
        let id = clip.id.clone();
        self.add_clip(clip)?;
        Ok(id)
    }

    /// Remove a clip. Clears the selection if it pointed at it.
    /// Duration is left alone; see [`Timeline::recompute_duration`].
    pub fn remove_clip(&mut self, id: &ClipId) -> Option<Clip> {
        for track in &mut self.tracks {
            if let Some(index) = track.clips.iter().position(|c| &c.id == id) {
                let removed = track.clips.remove(index);
                if self.selected_clip_id.as_ref() == Some(id) {
                    self.selected_clip_id = None;
                }
                tracing::debug!(clip = %id, "Clip removed");
                return Some(removed);
            }
        }
        None
    }

    /// Merge `update` into a clip. Returns false if the clip does not exist.
    pub fn update_clip(&mut self, id: &ClipId, update: ClipUpdate) -> bool {
        let Some(clip) = self
            .tracks
            .iter_mut()
            .flat_map(|t| t.clips.iter_mut())
            .find(|c| &c.id == id)
        else {
            return false;
        };

        update.apply(clip);
        let end = clip.end();
        self.duration = self.duration.max(end);
        true
    }

    /// Split a clip at absolute timeline time `at`.
    ///
    /// Returns the id of the new right-hand clip, which becomes selected.
    /// A split point that does not land strictly inside the trimmed range is
    /// rejected with no mutation.
    pub fn split_clip(&mut self, id: &ClipId, at: f64) -> Option<ClipId> {
        if !at.is_finite() {
            return None;
        }

        let (track_index, clip_index) = self.tracks.iter().enumerate().find_map(|(ti, t)| {
            t.clips
                .iter()
                .position(|c| &c.id == id)
                .map(|ci| (ti, ci))
        })?;

        let clips = &mut self.tracks[track_index].clips;
        let left = &clips[clip_index];
        let split_point = left.source_time_at(at);
        if split_point <= left.trim_start || split_point >= left.trim_end {
            return None;
        }

        let mut right = left.clone();
        right.id = ClipId::generate();
        right.start_time = at;
        right.trim_start = split_point;

        let right_id = right.id.clone();
        clips[clip_index].trim_end = split_point;
        clips.insert(clip_index + 1, right);
        self.selected_clip_id = Some(right_id.clone());

        tracing::debug!(clip = %id, right = %right_id, at, "Clip split");
        Some(right_id)
    }

    pub fn add_track(&mut self, track: Track) -> Result<(), TimelineError> {
        if self.track(&track.id).is_some() {
            return Err(TimelineError::DuplicateTrack { id: track.id });
        }
        self.duration = self.duration.max(track.end());
        self.tracks.push(track);
        Ok(())
    }

    /// Remove a track and every clip on it.
    pub fn remove_track(&mut self, id: &TrackId) -> Option<Track> {
        let index = self.tracks.iter().position(|t| &t.id == id)?;
        let track = self.tracks.remove(index);
        if let Some(selected) = &self.selected_clip_id {
            if track.clip(selected).is_some() {
                self.selected_clip_id = None;
            }
        }
        Some(track)
    }

    /// Move the playhead, clamped to `[0, duration]`. Returns the stored value.
    pub fn set_playhead_position(&mut self, t: f64) -> f64 {
        self.playhead_position = if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, self.duration)
        };
        self.playhead_position
    }

    /// Set zoom, clamped to the configured range. Returns the stored value.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = self.zoom_range.clamp(zoom);
        self.zoom
    }

    /// Select a clip, or clear the selection with `None`.
    /// Returns false (and changes nothing) for an unknown id.
    pub fn select_clip(&mut self, id: Option<ClipId>) -> bool {
        match id {
            Some(id) if self.clip(&id).is_none() => false,
            id => {
                self.selected_clip_id = id;
                true
            }
        }
    }

    /// Shrink or grow `duration` to exactly cover the current clips.
    pub fn recompute_duration(&mut self) -> f64 {
        self.duration = self.content_end();
        self.playhead_position = self.playhead_position.min(self.duration);
        self.duration
    }

    /// Drop every clip and reset to a single empty default track.
    pub fn clear(&mut self) {
        let zoom = self.zoom;
        let zoom_range = self.zoom_range;
        *self = Self {
            zoom,
            zoom_range,
            ..Self::new()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn track_id() -> TrackId {
        TrackId::new(DEFAULT_TRACK_ID)
    }

    fn source_clip(id: &str, start: f64, trim_start: f64, trim_end: f64) -> Clip {
        Clip::new(track_id(), format!("/media/{id}.mp4"), 10.0)
            .with_id(id)
            .with_trim(trim_start, trim_end)
            .at(start)
    }

    #[test]
    fn test_new_timeline_has_default_track() {
        let timeline = Timeline::new();
        assert_eq!(timeline.tracks().len(), 1);
        assert_eq!(timeline.tracks()[0].name, "Video Track 1");
        assert_eq!(timeline.zoom(), 20.0);
        assert_eq!(timeline.duration(), 0.0);
    }

    #[test]
    fn test_add_to_unknown_track_is_rejected() {
        let mut timeline = Timeline::new();
        let mut clip = source_clip("a", 0.0, 0.0, 5.0);
        clip.track_id = TrackId::new("nope");
        assert!(matches!(
            timeline.add_clip(clip),
            Err(TimelineError::UnknownTrack { .. })
        ));
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_duration_grows_but_never_shrinks_on_remove() {
        let mut timeline = Timeline::new();
        timeline.add_clip(source_clip("a", 20.0, 0.0, 5.0)).unwrap();
        assert_eq!(timeline.duration(), 25.0);

        timeline.remove_clip(&ClipId::new("a")).unwrap();
        assert_eq!(timeline.duration(), 25.0);

        assert_eq!(timeline.recompute_duration(), 0.0);
    }

    #[test]
    fn test_split_inside_bounds() {
        let mut timeline = Timeline::new();
        timeline.add_clip(source_clip("a", 0.0, 2.0, 8.0)).unwrap();

        let right = timeline.split_clip(&ClipId::new("a"), 3.0).unwrap();

        let left = timeline.clip(&ClipId::new("a")).unwrap();
        assert_eq!((left.trim_start, left.trim_end, left.start_time), (2.0, 5.0, 0.0));
        let right_clip = timeline.clip(&right).unwrap();
        assert_eq!(
            (right_clip.trim_start, right_clip.trim_end, right_clip.start_time),
            (5.0, 8.0, 3.0)
        );
        assert_eq!(timeline.selected_clip_id(), Some(&right));
        assert_eq!(timeline.clip_count(), 2);
    }

    #[test]
    fn test_split_outside_bounds_is_noop() {
        let mut timeline = Timeline::new();
        timeline.add_clip(source_clip("a", 0.0, 2.0, 8.0)).unwrap();
        let before = timeline.clone();

        for at in [-1.0, 15.0, 0.0, 6.0, f64::NAN] {
            assert!(timeline.split_clip(&ClipId::new("a"), at).is_none());
        }
        assert_eq!(timeline, before);
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut timeline = Timeline::new();
        timeline.add_clip(source_clip("a", 0.0, 0.0, 5.0)).unwrap();
        assert!(timeline.select_clip(Some(ClipId::new("a"))));
        timeline.remove_clip(&ClipId::new("a"));
        assert!(timeline.selected_clip_id().is_none());
    }

    #[test]
    fn test_select_unknown_clip_is_rejected() {
        let mut timeline = Timeline::new();
        assert!(!timeline.select_clip(Some(ClipId::new("ghost"))));
        assert!(timeline.select_clip(None));
    }

    #[test]
    fn test_playhead_and_zoom_are_clamped() {
        let mut timeline = Timeline::new();
        timeline.add_clip(source_clip("a", 0.0, 0.0, 5.0)).unwrap();
        assert_eq!(timeline.set_playhead_position(-3.0), 0.0);
        assert_eq!(timeline.set_playhead_position(99.0), 5.0);
        assert_eq!(timeline.set_playhead_position(f64::NAN), 0.0);
        assert_eq!(timeline.set_zoom(500.0), 100.0);
        assert_eq!(timeline.set_zoom(1.0), 10.0);
    }

    #[test]
    fn test_order_queries() {
        let mut timeline = Timeline::new();
        timeline.add_clip(source_clip("b", 8.0, 0.0, 3.0)).unwrap();
        timeline.add_clip(source_clip("a", 0.0, 0.0, 5.0)).unwrap();

        assert_eq!(timeline.clip_at(2.0).unwrap().id.as_str(), "a");
        assert!(timeline.clip_at(6.0).is_none());
        assert_eq!(timeline.first_clip_from(6.0).unwrap().id.as_str(), "b");
        assert_eq!(
            timeline.next_clip(&ClipId::new("a")).unwrap().id.as_str(),
            "b"
        );
        assert!(timeline.next_clip(&ClipId::new("b")).is_none());
        assert_eq!(
            timeline.previous_clip(&ClipId::new("b")).unwrap().id.as_str(),
            "a"
        );
    }

    #[test]
    fn test_append_source_lands_at_track_end() {
        let mut timeline = Timeline::new();
        timeline.add_clip(source_clip("a", 0.0, 0.0, 5.0)).unwrap();
        let item = LibraryItem::new("/media/next.mov", 4.0);

        let id = timeline.append_source(&track_id(), &item).unwrap();
        let clip = timeline.clip(&id).unwrap();
        assert_eq!(clip.start_time, 5.0);
        assert_eq!(clip.length(), 4.0);
        assert_eq!(timeline.duration(), 9.0);
    }

    #[test]
    fn test_remove_track_discards_clips() {
        let mut timeline = Timeline::new();
        timeline
            .add_track(Track::new(TrackId::new("track-2"), "Video Track 2"))
            .unwrap();
        let mut clip = source_clip("b", 0.0, 0.0, 2.0);
        clip.track_id = TrackId::new("track-2");
        timeline.add_clip(clip).unwrap();
        timeline.select_clip(Some(ClipId::new("b")));

        let removed = timeline.remove_track(&TrackId::new("track-2")).unwrap();
        assert_eq!(removed.clips.len(), 1);
        assert!(timeline.clip(&ClipId::new("b")).is_none());
        assert!(timeline.selected_clip_id().is_none());
        assert!(timeline
            .add_track(Track::new(track_id(), "dup"))
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_duration_covers_every_clip(
            spans in proptest::collection::vec((0.0f64..100.0, 0.0f64..5.0, 5.5f64..10.0), 1..12)
        ) {
            let mut timeline = Timeline::new();
            for (i, (start, trim_start, trim_end)) in spans.iter().enumerate() {
                timeline
                    .add_clip(source_clip(&format!("c{i}"), *start, *trim_start, *trim_end))
                    .unwrap();
            }
            for clip in timeline.clips() {
                prop_assert!(timeline.duration() >= clip.end());
            }
        }

        #[test]
        fn prop_split_partitions_trim_range(at in -5.0f64..20.0) {
            let mut timeline = Timeline::new();
            timeline.add_clip(source_clip("a", 1.0, 2.0, 8.0)).unwrap();

            match timeline.split_clip(&ClipId::new("a"), at) {
                Some(right) => {
                    let left = timeline.clip(&ClipId::new("a")).unwrap().clone();
                    let right = timeline.clip(&right).unwrap();
                    prop_assert_eq!(left.trim_end, right.trim_start);
                    prop_assert_eq!(left.trim_start, 2.0);
                    prop_assert_eq!(right.trim_end, 8.0);
                    prop_assert!((left.end() - right.start_time).abs() < 1e-9);
                }
                None => {
                    prop_assert_eq!(timeline.clip_count(), 1);
                    let clip = timeline.clip(&ClipId::new("a")).unwrap();
                    prop_assert_eq!((clip.trim_start, clip.trim_end), (2.0, 8.0));
                }
            }
        }
    }
}
