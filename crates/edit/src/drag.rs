//! Clip drags: trim handles and body moves.

use clipforge_project_model::{Clip, ClipId, ClipUpdate, Timeline};

use crate::trim::{propose_trim_left, propose_trim_right, ClipGeometry, Neighbours};

/// Abutting clips may differ by float noise; treat that as touching.
const OVERLAP_EPSILON: f64 = 1e-6;

fn intersects(start: f64, length: f64, other: &Clip) -> bool {
    start < other.end() - OVERLAP_EPSILON && other.start_time < start + length - OVERLAP_EPSILON
}

/// Resolve a proposed start time for a clip of `length` against the other
/// clips on its track.
///
/// A free placement is taken as is (floored at zero). Otherwise the clip is
/// snapped against an obstacle edge, either abutting an obstacle's end or
/// ending where an obstacle starts, whichever valid candidate is closest to
/// the proposal. When no candidate fits, `fallback` (the last known good
/// start) is returned.
pub fn resolve_collision<'a>(
    others: impl IntoIterator<Item = &'a Clip>,
    proposed: f64,
    length: f64,
    fallback: f64,
) -> f64 {
    let others: Vec<&Clip> = others.into_iter().collect();
    let collides = |start: f64| others.iter().any(|o| intersects(start, length, o));

    let wanted = if proposed.is_finite() { proposed.max(0.0) } else { 0.0 };
    if !collides(wanted) {
        return wanted;
    }

    others
        .iter()
        .flat_map(|o| [o.end(), o.start_time - length])
        .filter(|candidate| *candidate >= 0.0 && !collides(*candidate))
        .min_by(|a, b| (a - wanted).abs().total_cmp(&(b - wanted).abs()))
        .unwrap_or(fallback)
}

/// Which part of the clip the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    TrimLeft,
    TrimRight,
    Move,
}

/// An in-progress drag on one clip.
///
/// Each [`ClipDrag::update`] recomputes from the geometry captured at
/// [`ClipDrag::begin`], so the clip tracks the pointer rather than
/// accumulating per-event deltas.
#[derive(Debug, Clone)]
pub struct ClipDrag {
    clip_id: ClipId,
    kind: DragKind,
    origin: ClipGeometry,
    neighbours: Neighbours,
    pointer_origin_px: f64,
    min_clip_secs: f64,
}

impl ClipDrag {
    /// Start a drag; the grabbed clip becomes selected.
    pub fn begin(
        timeline: &mut Timeline,
        clip_id: &ClipId,
        kind: DragKind,
        pointer_x: f64,
        min_clip_secs: f64,
    ) -> Option<Self> {
        let track = timeline.track_of(clip_id)?;
        let clip = track.clip(clip_id)?;
        let drag = Self {
            clip_id: clip_id.clone(),
            kind,
            origin: ClipGeometry::of(clip),
            neighbours: Neighbours::around(track, clip_id),
            pointer_origin_px: pointer_x,
            min_clip_secs,
        };
        timeline.select_clip(Some(clip_id.clone()));
        tracing::trace!(clip = %clip_id, ?kind, "Clip drag started");
        Some(drag)
    }

    pub fn clip_id(&self) -> &ClipId {
        &self.clip_id
    }

    pub fn kind(&self) -> DragKind {
        self.kind
    }

    /// Apply the pointer's current position. Returns true if the clip changed.
    pub fn update(&self, timeline: &mut Timeline, pointer_x: f64) -> bool {
        let zoom = timeline.zoom();
        if zoom <= 0.0 {
            return false;
        }
        let delta = (pointer_x - self.pointer_origin_px) / zoom;

        let update = match self.kind {
            DragKind::TrimLeft => {
                propose_trim_left(self.origin, delta, self.min_clip_secs, self.neighbours)
            }
            DragKind::TrimRight => {
                propose_trim_right(self.origin, delta, self.min_clip_secs, self.neighbours)
            }
            DragKind::Move => self.propose_move(timeline, delta),
        };

        match update {
            Some(update) => timeline.update_clip(&self.clip_id, update),
            None => false,
        }
    }

    fn propose_move(&self, timeline: &Timeline, delta: f64) -> Option<ClipUpdate> {
        let track = timeline.track_of(&self.clip_id)?;
        let current = track.clip(&self.clip_id)?;
        let others = track.clips.iter().filter(|c| c.id != self.clip_id);

        let start = resolve_collision(
            others,
            self.origin.start_time + delta,
            self.origin.length(),
            current.start_time,
        );
        Some(ClipUpdate::start_time(start))
    }
}
