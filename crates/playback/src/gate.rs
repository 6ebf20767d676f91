//! Single-slot gate between a scrub-end resync and the next play request.
//!
//! The slot is reserved synchronously, at the moment scrubbing ends, and
//! released when the returned [`ResyncGuard`] drops. A newer reservation
//! takes the slot over; the superseded guard's drop is then a no-op, so the
//! slot only frees once the latest holder is done.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug)]
pub struct ResyncGate {
    slot: Arc<watch::Sender<Option<u64>>>,
    next_ticket: AtomicU64,
}

impl Default for ResyncGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ResyncGate {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Take the slot, superseding any current holder.
    pub fn reserve(&self) -> ResyncGuard {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.slot.send_replace(Some(ticket));
        ResyncGuard {
            slot: Arc::clone(&self.slot),
            ticket,
        }
    }

    pub fn is_held(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Wait until nobody holds the slot. Returns immediately if it is free.
    pub async fn wait(&self) {
        let mut rx = self.slot.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(Option::is_none).await;
    }
}

/// Holds the [`ResyncGate`] slot until dropped.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the guard drops"]
pub struct ResyncGuard {
    slot: Arc<watch::Sender<Option<u64>>>,
    ticket: u64,
}

impl ResyncGuard {
    /// Whether this guard still owns the slot.
    pub fn is_current(&self) -> bool {
        *self.slot.borrow() == Some(self.ticket)
    }
}

impl Drop for ResyncGuard {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.slot.send_if_modified(|slot| {
            if *slot == Some(ticket) {
                *slot = None;
                true
            } else {
                false
            }
        });
    }
}
