//! In/out point trimming.
//!
//! Proposals are computed against the geometry captured when the gesture
//! started, so repeated pointer moves never accumulate rounding drift.

use clipforge_project_model::{Clip, ClipId, ClipUpdate, Track};

/// Clip placement captured at gesture start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipGeometry {
    pub start_time: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub source_duration: f64,
}

impl ClipGeometry {
    pub fn of(clip: &Clip) -> Self {
        Self {
            start_time: clip.start_time,
            trim_start: clip.trim_start,
            trim_end: clip.trim_end,
            source_duration: clip.duration,
        }
    }

    pub fn length(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    pub fn end(&self) -> f64 {
        self.start_time + self.length()
    }
}

/// Closest obstacles on either side of a clip on its track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Neighbours {
    /// End of the nearest clip starting before this one.
    pub previous_end: Option<f64>,
    /// Start of the nearest clip starting at or after this one.
    pub next_start: Option<f64>,
}

impl Neighbours {
    pub fn around(track: &Track, clip_id: &ClipId) -> Self {
        let Some(clip) = track.clip(clip_id) else {
            return Self::default();
        };

        let mut neighbours = Self::default();
        for other in track.clips.iter().filter(|c| &c.id != clip_id) {
            if other.start_time < clip.start_time {
                let end = other.end();
                neighbours.previous_end = Some(neighbours.previous_end.map_or(end, |e| e.max(end)));
            } else {
                let start = other.start_time;
                neighbours.next_start = Some(neighbours.next_start.map_or(start, |s| s.min(start)));
            }
        }
        neighbours
    }
}

/// Move the in-point by `delta` seconds.
///
/// The clip's timeline start follows its in-point. The result keeps at least
/// `min_length` of material, never starts before zero or before the previous
/// clip, and never reads before the start of the source. Returns `None` when
/// no valid placement exists.
pub fn propose_trim_left(
    origin: ClipGeometry,
    delta: f64,
    min_length: f64,
    neighbours: Neighbours,
) -> Option<ClipUpdate> {
    if !delta.is_finite() {
        return None;
    }

    let mut lowest = (-origin.trim_start).max(-origin.start_time);
    if let Some(previous_end) = neighbours.previous_end {
        lowest = lowest.max(previous_end - origin.start_time);
    }
    let highest = origin.trim_end - min_length - origin.trim_start;
    if highest < lowest {
        return None;
    }

    let applied = delta.clamp(lowest, highest);
    Some(ClipUpdate::trim_in(
        origin.trim_start + applied,
        origin.start_time + applied,
    ))
}

/// Move the out-point by `delta` seconds.
///
/// Keeps at least `min_length` of material, never reads past the end of the
/// source, and never runs into the next clip. The timeline start is fixed.
pub fn propose_trim_right(
    origin: ClipGeometry,
    delta: f64,
    min_length: f64,
    neighbours: Neighbours,
) -> Option<ClipUpdate> {
    if !delta.is_finite() {
        return None;
    }

    let lowest = origin.trim_start + min_length;
    let mut highest = origin.source_duration;
    if let Some(next_start) = neighbours.next_start {
        highest = highest.min(origin.trim_start + (next_start - origin.start_time));
    }
    if highest < lowest {
        return None;
    }

    Some(ClipUpdate::trim_out(
        (origin.trim_end + delta).clamp(lowest, highest),
    ))
}
