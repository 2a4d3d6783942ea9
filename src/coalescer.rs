//! Pending-write coalescer: per-item patch buffer with a dual-latency flush policy.
//!
//! DESIGN
//! ======
//! Every item with unsaved edits owns one [`PendingEntry`] holding the merged
//! patch, the debounce timer handle, and the in-flight bookkeeping, so the
//! patch and its timer can never drift apart. Content and time-label edits
//! flush immediately; position/size edits flush on the trailing edge of a
//! per-item debounce window.
//!
//! Flushes for one item are serialized. A flush requested while another is
//! in flight marks the entry dirty; when the in-flight call resolves the
//! latest merged patch is sent right away. Edits recorded during a flight
//! land in the entry's pending patch, never in the one being sent, so no
//! write is lost between "read" and "clear".
//!
//! Results are reported as [`FlushEvent`]s over an mpsc channel; the owner
//! decides how to recover from failures.

#[cfg(test)]
#[path = "coalescer_test.rs"]
mod coalescer_test;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::item::{ItemId, ItemPatch};
use crate::store::ItemStore;

/// How a recorded change will reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Sent now; any pending debounce timer was cancelled first.
    Immediate,
    /// Sent when the debounce window after the last change elapses.
    Debounced,
}

/// Outcome of one store update issued by the coalescer.
#[derive(Debug, Clone, PartialEq)]
pub enum FlushEvent {
    /// The store accepted the patch.
    Flushed {
        id: ItemId,
        /// The patch touched content or time label.
        urgent: bool,
    },
    /// The store call failed; local optimistic state may be wrong.
    Failed { id: ItemId, error: PersistenceError },
}

#[derive(Default)]
struct PendingEntry {
    /// Edits not yet handed to the store.
    patch: ItemPatch,
    /// The patch currently being sent, if any.
    in_flight: Option<ItemPatch>,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the timer is cancelled; a woken timer with an older generation does nothing.
    generation: u64,
    /// A flush was requested while another was in flight.
    dirty_since_flush: bool,
}

impl PendingEntry {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
    }

    fn is_idle(&self) -> bool {
        self.patch.is_empty() && self.in_flight.is_none() && self.timer.is_none()
    }
}

#[derive(Default)]
struct PendingState {
    entries: HashMap<ItemId, PendingEntry>,
    closed: bool,
}

struct CoalescerInner {
    store: Arc<dyn ItemStore>,
    debounce: Duration,
    events: mpsc::UnboundedSender<FlushEvent>,
    state: Mutex<PendingState>,
}

/// Buffers item patches and flushes them to the store.
///
/// Cheap to clone; clones share the same buffer. Must be used inside a Tokio
/// runtime because timers and flushes are spawned tasks.
#[derive(Clone)]
pub struct Coalescer {
    inner: Arc<CoalescerInner>,
}

impl Coalescer {
    #[must_use]
    pub fn new(store: Arc<dyn ItemStore>, debounce: Duration, events: mpsc::UnboundedSender<FlushEvent>) -> Self {
        Self {
            inner: Arc::new(CoalescerInner { store, debounce, events, state: Mutex::new(PendingState::default()) }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PendingState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge `patch` into the item's pending update and schedule its flush.
    ///
    /// Returns `None` when nothing was recorded (empty patch, or torn down).
    pub fn record_change(&self, id: ItemId, patch: ItemPatch) -> Option<FlushPolicy> {
        if patch.is_empty() {
            return None;
        }
        let policy = if patch.is_urgent() { FlushPolicy::Immediate } else { FlushPolicy::Debounced };

        {
            let mut state = self.lock();
            if state.closed {
                debug!(item_id = %id, "change ignored after teardown");
                return None;
            }
            let entry = state.entries.entry(id).or_default();
            entry.patch.merge(patch);
            entry.cancel_timer();
            if policy == FlushPolicy::Debounced {
                entry.timer = Some(self.spawn_timer(id, entry.generation));
            }
        }

        if policy == FlushPolicy::Immediate {
            self.flush(id);
        }
        Some(policy)
    }

    fn spawn_timer(&self, id: ItemId, generation: u64) -> JoinHandle<()> {
        let coalescer = self.clone();
        let debounce = self.inner.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            coalescer.fire_timer(id, generation);
        })
    }

    fn fire_timer(&self, id: ItemId, generation: u64) {
        {
            let mut state = self.lock();
            let Some(entry) = state.entries.get_mut(&id) else {
                return;
            };
            if entry.generation != generation {
                return;
            }
            entry.timer = None;
        }
        self.flush(id);
    }

    /// Send the item's pending patch now, cancelling its debounce timer.
    ///
    /// If a flush for the item is already in flight, the entry is marked
    /// dirty and flushed again as soon as that call resolves.
    pub fn flush(&self, id: ItemId) {
        let patch = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if state.closed {
                return;
            }
            let Some(entry) = state.entries.get_mut(&id) else {
                return;
            };
            entry.cancel_timer();
            if entry.in_flight.is_some() {
                entry.dirty_since_flush = true;
                debug!(item_id = %id, "flush deferred behind in-flight write");
                return;
            }
            if entry.patch.is_empty() {
                state.entries.remove(&id);
                return;
            }
            let patch = std::mem::take(&mut entry.patch);
            entry.in_flight = Some(patch.clone());
            patch
        };

        let coalescer = self.clone();
        tokio::spawn(async move { coalescer.run_flush(id, patch).await });
    }

    /// Flush every item with pending edits.
    pub fn flush_all(&self) {
        let ids: Vec<ItemId> = self.lock().entries.keys().copied().collect();
        for id in ids {
            self.flush(id);
        }
    }

    async fn run_flush(self, id: ItemId, first: ItemPatch) {
        let mut patch = first;
        loop {
            let urgent = patch.is_urgent();
            debug!(item_id = %id, urgent, "flushing pending update");
            let result = self.inner.store.update_item(id, &patch).await;

            let next = self.finish_flight(id);

            let event = match result {
                Ok(_) => FlushEvent::Flushed { id, urgent },
                Err(error) => {
                    warn!(item_id = %id, error = %error, "item update failed");
                    FlushEvent::Failed { id, error }
                }
            };
            if self.inner.events.send(event).is_err() {
                debug!(item_id = %id, "flush event receiver dropped");
            }

            match next {
                Some(next) => patch = next,
                None => break,
            }
        }
    }

    /// Clear the in-flight marker; return the next patch if a flush was requested meanwhile.
    fn finish_flight(&self, id: ItemId) -> Option<ItemPatch> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let closed = state.closed;
        let entry = state.entries.get_mut(&id)?;
        entry.in_flight = None;

        if entry.dirty_since_flush && !entry.patch.is_empty() && !closed {
            entry.dirty_since_flush = false;
            entry.cancel_timer();
            let next = std::mem::take(&mut entry.patch);
            entry.in_flight = Some(next.clone());
            return Some(next);
        }

        entry.dirty_since_flush = false;
        if entry.is_idle() {
            state.entries.remove(&id);
        }
        None
    }

    /// Drop the item's pending update and cancel its timer (item deleted).
    pub fn discard(&self, id: ItemId) {
        if let Some(mut entry) = self.lock().entries.remove(&id) {
            entry.cancel_timer();
        }
    }

    /// Cancel every timer and drop every pending update. Later changes are ignored.
    pub fn teardown(&self) {
        let mut state = self.lock();
        state.closed = true;
        for entry in state.entries.values_mut() {
            entry.cancel_timer();
        }
        state.entries.clear();
    }

    /// Unsent and in-flight edits for the item, merged, newest fields winning.
    #[must_use]
    pub fn pending_patch(&self, id: ItemId) -> Option<ItemPatch> {
        let state = self.lock();
        let entry = state.entries.get(&id)?;
        let mut merged = entry.in_flight.clone().unwrap_or_default();
        merged.merge(entry.patch.clone());
        (!merged.is_empty()).then_some(merged)
    }

    /// Ids of items with unsent or in-flight edits.
    #[must_use]
    pub fn pending_ids(&self) -> HashSet<ItemId> {
        let state = self.lock();
        state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.patch.is_empty() || entry.in_flight.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether a debounce timer is outstanding for the item.
    #[must_use]
    pub fn has_timer(&self, id: ItemId) -> bool {
        self.lock().entries.get(&id).is_some_and(|entry| entry.timer.is_some())
    }

    /// Whether the coalescer has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
