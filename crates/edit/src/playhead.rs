//! Playhead scrubbing.

use clipforge_common::{TransportBus, TransportSignal};
use clipforge_project_model::{EditorStore, Timeline};

/// Timeline time under a pixel offset, clamped to `[0, duration]`.
pub fn time_at_pixel(timeline: &Timeline, x: f64) -> f64 {
    let zoom = timeline.zoom();
    if zoom <= 0.0 || !x.is_finite() {
        return 0.0;
    }
    (x / zoom).clamp(0.0, timeline.duration())
}

/// Click-to-seek on the ruler. Returns the new playhead.
pub fn seek_to_pixel(timeline: &mut Timeline, x: f64) -> f64 {
    let t = time_at_pixel(timeline, x);
    timeline.set_playhead_position(t)
}

/// An in-progress playhead drag.
///
/// The offset between the pointer and the playhead is fixed when the drag
/// starts, so grabbing the playhead off-centre does not make it jump.
/// Starting the drag emits [`TransportSignal::PausePlayback`], each
/// [`scrub`](Self::scrub) emits [`TransportSignal::PlayheadScrubbed`], and
/// ending it emits [`TransportSignal::ScrubbingEnd`].
///
/// Signals are delivered synchronously, so `begin`, `scrub` and `end` must
/// not be called while holding the editor store lock.
#[derive(Debug)]
pub struct PlayheadDrag {
    grab_offset_px: f64,
    bus: TransportBus,
}

impl PlayheadDrag {
    pub fn begin(playhead: f64, zoom: f64, pointer_x: f64, bus: &TransportBus) -> Self {
        bus.emit(TransportSignal::PausePlayback);
        Self {
            grab_offset_px: pointer_x - playhead * zoom,
            bus: bus.clone(),
        }
    }

    /// Move the playhead to follow the pointer. Returns the stored position.
    pub fn update(&self, timeline: &mut Timeline, pointer_x: f64) -> f64 {
        let zoom = timeline.zoom();
        if zoom <= 0.0 {
            return timeline.playhead_position();
        }
        timeline.set_playhead_position((pointer_x - self.grab_offset_px) / zoom)
    }

    /// Move the store's playhead to follow the pointer, then let the preview
    /// catch up. Returns the stored position.
    pub fn scrub(&self, store: &EditorStore, pointer_x: f64) -> f64 {
        let t = store.update_timeline(|tl| self.update(tl, pointer_x));
        self.bus.emit(TransportSignal::PlayheadScrubbed);
        t
    }

    pub fn end(self) {
        self.bus.emit(TransportSignal::ScrubbingEnd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_common::TransportListener;
    use clipforge_project_model::{Clip, EditorState, TrackId, DEFAULT_TRACK_ID};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TransportSignal>>);

    impl TransportListener for Recorder {
        fn on_transport_signal(self: Arc<Self>, signal: TransportSignal) {
            self.0.lock().unwrap().push(signal);
        }
    }

    fn timeline() -> Timeline {
        let mut timeline = Timeline::new();
        timeline
            .add_clip(Clip::new(TrackId::new(DEFAULT_TRACK_ID), "/a.mp4", 10.0))
            .unwrap();
        timeline.set_zoom(20.0);
        timeline
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let bus = TransportBus::new();
        let mut timeline = timeline();
        timeline.set_playhead_position(2.0);

        // Playhead drawn at 40px; grabbed 6px to its right.
        let drag = PlayheadDrag::begin(2.0, 20.0, 46.0, &bus);
        assert_eq!(drag.update(&mut timeline, 46.0), 2.0);
        assert_eq!(drag.update(&mut timeline, 106.0), 5.0);
        assert_eq!(drag.update(&mut timeline, -500.0), 0.0);
        assert_eq!(drag.update(&mut timeline, 5000.0), 10.0);
    }

    #[test]
    fn test_drag_emits_pause_then_scrub_end() {
        let bus = TransportBus::new();
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(&recorder);

        let drag = PlayheadDrag::begin(0.0, 20.0, 0.0, &bus);
        assert_eq!(*recorder.0.lock().unwrap(), vec![TransportSignal::PausePlayback]);
        drag.end();
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![TransportSignal::PausePlayback, TransportSignal::ScrubbingEnd]
        );
    }

    #[test]
    fn test_scrub_moves_store_then_signals() {
        let bus = TransportBus::new();
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(&recorder);
        let mut state = EditorState::new("scrub");
        state.timeline = timeline();
        let store = EditorStore::new(state);

        let drag = PlayheadDrag::begin(0.0, 20.0, 0.0, &bus);
        assert_eq!(drag.scrub(&store, 80.0), 4.0);
        assert_eq!(store.playhead(), 4.0);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![TransportSignal::PausePlayback, TransportSignal::PlayheadScrubbed]
        );
    }

    #[test]
    fn test_seek_to_pixel_clamps() {
        let mut timeline = timeline();
        assert_eq!(seek_to_pixel(&mut timeline, 60.0), 3.0);
        assert_eq!(seek_to_pixel(&mut timeline, 1e9), 10.0);
        assert_eq!(time_at_pixel(&timeline, f64::NAN), 0.0);
    }
}
