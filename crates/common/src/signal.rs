//! Transport signals between the timeline editing surface and playback.
//!
//! Playhead dragging needs to tell the preview to get out of the way
//! (`PausePlayback`), to follow the pointer while it moves
//! (`PlayheadScrubbed`), and on release to resynchronize (`ScrubbingEnd`).
//! Delivery is synchronous: `emit` returns only after every live listener
//! has observed the signal, so a command issued right after `emit` is
//! ordered after the listener's reaction to it.

use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Payload-free signals emitted while the user drags the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportSignal {
    /// The user grabbed the playhead; stop the preview.
    PausePlayback,
    /// The dragged playhead moved; preview the new position.
    PlayheadScrubbed,
    /// The user released the playhead; resync the preview to it.
    ScrubbingEnd,
}

/// Receiver side of the transport bus.
pub trait TransportListener: Send + Sync {
    /// Called synchronously from [`TransportBus::emit`].
    fn on_transport_signal(self: Arc<Self>, signal: TransportSignal);
}

/// Typed observer bus for [`TransportSignal`]s.
///
/// Listeners are held weakly; dropped listeners are pruned on the next emit.
#[derive(Clone, Default)]
pub struct TransportBus {
    listeners: Arc<RwLock<Vec<Weak<dyn TransportListener>>>>,
}

impl TransportBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The bus does not keep it alive.
    pub fn subscribe<L: TransportListener + 'static>(&self, listener: &Arc<L>) {
        let listener: Arc<dyn TransportListener> = listener.clone();
        let weak = Arc::downgrade(&listener);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(weak);
    }

    /// Deliver `signal` to every live listener, in subscription order.
    pub fn emit(&self, signal: TransportSignal) {
        let live: Vec<Arc<dyn TransportListener>> = {
            let mut listeners = self
                .listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        tracing::trace!(?signal, listeners = live.len(), "Transport signal");
        for listener in live {
            listener.on_transport_signal(signal);
        }
    }

    /// Number of listeners still alive.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for TransportBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<TransportSignal>>,
    }

    impl TransportListener for Recorder {
        fn on_transport_signal(self: Arc<Self>, signal: TransportSignal) {
            self.seen.lock().unwrap().push(signal);
        }
    }

    #[test]
    fn test_emit_reaches_listener_in_order() {
        let bus = TransportBus::new();
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(&recorder);

        bus.emit(TransportSignal::PausePlayback);
        bus.emit(TransportSignal::PlayheadScrubbed);
        bus.emit(TransportSignal::ScrubbingEnd);

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![
                TransportSignal::PausePlayback,
                TransportSignal::PlayheadScrubbed,
                TransportSignal::ScrubbingEnd
            ]
        );
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let bus = TransportBus::new();
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(&recorder);
        assert_eq!(bus.listener_count(), 1);

        drop(recorder);
        bus.emit(TransportSignal::ScrubbingEnd);
        assert_eq!(bus.listener_count(), 0);
    }
}
