//! Split and delete commands driven by selection and playhead.

use clipforge_project_model::{Clip, ClipId, Timeline};

/// Split at the playhead.
///
/// Targets the selected clip, or the clip under the playhead when nothing is
/// selected. Returns the new right-hand clip; `None` means nothing changed.
pub fn split_at_playhead(timeline: &mut Timeline) -> Option<ClipId> {
    let playhead = timeline.playhead_position();
    let target = match timeline.selected_clip_id() {
        Some(id) => id.clone(),
        None => timeline.clip_at(playhead)?.id.clone(),
    };

    let right = timeline.split_clip(&target, playhead);
    if right.is_none() {
        tracing::debug!(clip = %target, playhead, "Split rejected: playhead outside clip");
    }
    right
}

/// Remove the selected clip.
pub fn delete_selected(timeline: &mut Timeline) -> Option<Clip> {
    let id = timeline.selected_clip_id()?.clone();
    timeline.remove_clip(&id)
}
