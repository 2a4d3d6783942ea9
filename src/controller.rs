//! Collection controller: owns one board's live item list and routes every
//! user action through interaction, coalescing, and reconciliation.
//!
//! DESIGN
//! ======
//! The controller is the only writer of the local item list. User input is
//! applied optimistically and synchronously; persistence happens afterwards
//! on spawned tasks:
//!
//! ```text
//! pointer/keyboard ─▶ ItemInteraction ─▶ ItemPatch ─▶ local item (now)
//!                                                 └─▶ Coalescer ─▶ ItemStore
//!                                                          │
//!                                 FlushEvent (mpsc) ◀──────┘
//!                                        │
//!                    urgent ok: refresh after delay, failure: notice + refresh
//! ```
//!
//! Local state sits behind a `std::sync::Mutex` that is never held across an
//! `.await` and never held while the coalescer's own lock is taken.
//!
//! ERROR HANDLING
//! ==============
//! Persistence failures never propagate into the interaction state machine.
//! They are converted into a [`Notice`] plus a refresh at the point where they
//! are observed. Async entry points also return them as [`EditorError`] so
//! callers can await the outcome.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coalescer::{Coalescer, FlushEvent, FlushPolicy};
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::geometry::Point;
use crate::interaction::{EditDraft, InteractionState, ItemInteraction, Modifiers, PointerDown, PointerOutcome};
use crate::item::{BoardId, Item, ItemId, ItemKind, ItemPatch, NewItem};
use crate::reconcile::{Reconciled, reconcile};
use crate::shortcuts::{Command, KeyOutcome, ShortcutTable};
use crate::store::ItemStore;

// =============================================================================
// Notices
// =============================================================================

/// Transient user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SaveFailed { id: ItemId, message: String },
    CreateFailed { message: String },
    DeleteFailed { id: ItemId, message: String },
    RefreshFailed { message: String },
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::SaveFailed { message, .. }
            | Self::CreateFailed { message }
            | Self::DeleteFailed { message, .. }
            | Self::RefreshFailed { message } => message,
        }
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Default)]
struct BoardState {
    items: Vec<Item>,
    /// At most one selected item.
    selection: Option<ItemId>,
    interactions: HashMap<ItemId, ItemInteraction>,
    /// Intrinsic width / height of images, once known.
    aspect_ratios: HashMap<ItemId, f64>,
    /// Deleted locally, store delete not yet resolved. Never re-adopted from a snapshot.
    deleting: HashSet<ItemId>,
    /// A text field has keyboard focus.
    text_focused: bool,
    shortcuts: ShortcutTable,
    refresh_timer: Option<JoinHandle<()>>,
    event_task: Option<JoinHandle<()>>,
    closed: bool,
}

impl BoardState {
    fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    fn apply_local(&mut self, id: ItemId, patch: &ItemPatch) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.apply(patch);
                true
            }
            None => false,
        }
    }

    fn forget(&mut self, id: ItemId) {
        self.interactions.remove(&id);
        self.aspect_ratios.remove(&id);
        if self.selection == Some(id) {
            self.selection = None;
        }
    }
}

struct Shared {
    board_id: BoardId,
    store: Arc<dyn ItemStore>,
    config: EditorConfig,
    coalescer: Coalescer,
    notices: mpsc::UnboundedSender<Notice>,
    state: Mutex<BoardState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn notify(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            debug!("notice receiver dropped");
        }
    }

    /// Fetch the authoritative list and reconcile it into local state.
    async fn refresh(&self) -> Result<(), EditorError> {
        if self.is_closed() {
            return Err(EditorError::Closed);
        }

        // Writes in flight when the list is requested may land before it answers.
        let mut protected = self.coalescer.pending_ids();
        let mut snapshot = match self.store.list_items(self.board_id).await {
            Ok(items) => items,
            Err(error) => {
                warn!(board_id = %self.board_id, error = %error, "board refresh failed");
                self.notify(Notice::RefreshFailed { message: error.to_string() });
                return Err(error.into());
            }
        };

        protected.extend(self.coalescer.pending_ids());
        let removed = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if state.closed {
                return Err(EditorError::Closed);
            }
            snapshot.retain(|item| !state.deleting.contains(&item.id));
            protected.extend(
                state
                    .interactions
                    .iter()
                    .filter(|(_, interaction)| interaction.is_editing())
                    .map(|(id, _)| *id),
            );

            let Reconciled { items, added, removed } = reconcile(&state.items, snapshot, &protected);
            state.items = items;
            for id in &removed {
                state.forget(*id);
            }
            debug!(
                board_id = %self.board_id,
                items = state.items.len(),
                added = added.len(),
                removed = removed.len(),
                "board reconciled"
            );
            removed
        };

        for id in removed {
            self.coalescer.discard(id);
        }
        Ok(())
    }

    /// Run a refresh after `delay`, replacing any refresh already scheduled.
    fn schedule_refresh(self: &Arc<Self>, delay: Duration) {
        let weak = Arc::downgrade(self);
        let mut state = self.lock();
        if state.closed {
            return;
        }
        if let Some(previous) = state.refresh_timer.take() {
            previous.abort();
        }
        state.refresh_timer = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if let Err(error) = shared.refresh().await {
                debug!(error = %error, "scheduled refresh did not complete");
            }
        }));
    }

    fn on_flush_event(self: &Arc<Self>, event: FlushEvent) {
        match event {
            FlushEvent::Flushed { id, urgent: true } => {
                debug!(item_id = %id, "text saved, scheduling refresh");
                self.schedule_refresh(self.config.refresh_delay);
            }
            FlushEvent::Flushed { id, urgent: false } => {
                debug!(item_id = %id, "geometry saved");
            }
            FlushEvent::Failed { id, error } => {
                warn!(item_id = %id, error = %error, "save failed, refreshing");
                self.notify(Notice::SaveFailed { id, message: error.to_string() });
                self.schedule_refresh(Duration::ZERO);
            }
        }
    }

    /// Optimistic half of a delete: drop the item and everything keyed by it.
    fn remove_local(&self, id: ItemId) -> bool {
        let removed = {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            let before = state.items.len();
            state.items.retain(|item| item.id != id);
            state.forget(id);
            let removed = state.items.len() != before;
            if removed {
                state.deleting.insert(id);
            }
            removed
        };
        if removed {
            self.coalescer.discard(id);
        }
        removed
    }

    /// Network half of a delete. On failure, notify and refresh to restore the item.
    async fn persist_delete(&self, id: ItemId) -> Result<(), EditorError> {
        let result = self.store.delete_item(id).await;
        self.lock().deleting.remove(&id);
        match result {
            Ok(()) => {
                info!(item_id = %id, "item deleted");
                Ok(())
            }
            Err(error) => {
                warn!(item_id = %id, error = %error, "delete failed, refreshing");
                self.notify(Notice::DeleteFailed { id, message: error.to_string() });
                self.refresh_after_failure().await;
                Err(error.into())
            }
        }
    }

    async fn refresh_after_failure(&self) {
        if let Err(error) = self.refresh().await {
            debug!(error = %error, "recovery refresh did not complete");
        }
    }
}

async fn run_flush_events(shared: Weak<Shared>, mut events: mpsc::UnboundedReceiver<FlushEvent>) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.on_flush_event(event);
    }
}

// =============================================================================
// BoardController
// =============================================================================

/// Live editing session for one board.
///
/// Must be created inside a Tokio runtime. Dropping the controller tears it
/// down: every timer and background task it owns is cancelled.
pub struct BoardController {
    shared: Arc<Shared>,
}

impl BoardController {
    /// Build a controller with an empty item list; call [`Self::refresh`] to load.
    ///
    /// Returns the receiving end of the user-notification channel.
    #[must_use]
    pub fn new(
        board_id: BoardId,
        store: Arc<dyn ItemStore>,
        config: EditorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (flush_tx, flush_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let coalescer = Coalescer::new(store.clone(), config.debounce, flush_tx);
        let shared = Arc::new(Shared {
            board_id,
            store,
            config,
            coalescer,
            notices: notice_tx,
            state: Mutex::new(BoardState::default()),
        });

        let task = tokio::spawn(run_flush_events(Arc::downgrade(&shared), flush_rx));
        shared.lock().event_task = Some(task);

        info!(board_id = %board_id, "board controller started");
        (Self { shared }, notice_rx)
    }

    #[must_use]
    pub fn board_id(&self) -> BoardId {
        self.shared.board_id
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Snapshot of the local item list.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.shared.lock().items.clone()
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.shared.lock().find(id).cloned()
    }

    #[must_use]
    pub fn interaction_state(&self, id: ItemId) -> InteractionState {
        self.shared
            .lock()
            .interactions
            .get(&id)
            .map(|interaction| interaction.state().clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn draft(&self, id: ItemId) -> Option<EditDraft> {
        self.shared.lock().interactions.get(&id)?.draft().cloned()
    }

    /// Unsaved edits for the item, if any.
    #[must_use]
    pub fn pending_patch(&self, id: ItemId) -> Option<ItemPatch> {
        self.shared.coalescer.pending_patch(id)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    // ── Selection ────────────────────────────────────────────────

    #[must_use]
    pub fn selection(&self) -> Option<ItemId> {
        self.shared.lock().selection
    }

    /// Select an item on the board. `false` if it is not on the board.
    pub fn select(&self, id: ItemId) -> bool {
        let mut state = self.shared.lock();
        if state.closed || state.find(id).is_none() {
            return false;
        }
        state.selection = Some(id);
        true
    }

    pub fn clear_selection(&self) {
        self.shared.lock().selection = None;
    }

    // ── Item metadata ────────────────────────────────────────────

    /// Record an image's intrinsic width / height once it is known.
    ///
    /// Ignored for notes, unknown items, and ratios that are not finite and positive.
    pub fn set_image_aspect_ratio(&self, id: ItemId, ratio: f64) -> bool {
        if !ratio.is_finite() || ratio <= 0.0 {
            debug!(item_id = %id, ratio, "invalid aspect ratio ignored");
            return false;
        }
        let mut state = self.shared.lock();
        if state.find(id).is_none_or(|item| item.kind != ItemKind::Image) {
            return false;
        }
        state.aspect_ratios.insert(id, ratio);
        true
    }

    // ── Pointer input ────────────────────────────────────────────

    /// Pointer pressed on an item. Selects the item when the event is accepted.
    pub fn pointer_down(&self, id: ItemId, event: PointerDown) -> PointerOutcome {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        if state.closed {
            return PointerOutcome::Ignored;
        }
        let Some(item) = state.items.iter().find(|item| item.id == id) else {
            return PointerOutcome::Ignored;
        };
        let aspect_ratio = state.aspect_ratios.get(&id).copied();
        let outcome = state.interactions.entry(id).or_default().pointer_down(item, aspect_ratio, event);
        if outcome != PointerOutcome::Ignored {
            state.selection = Some(id);
            debug!(item_id = %id, ?outcome, "pointer down");
        }
        outcome
    }

    /// Pointer moved during a gesture. Returns whether geometry changed.
    pub fn pointer_move(&self, id: ItemId, point: Point) -> bool {
        let patch = {
            let mut state = self.shared.lock();
            if state.closed {
                return false;
            }
            state.interactions.get_mut(&id).and_then(|interaction| interaction.pointer_move(point))
        };
        patch.is_some_and(|patch| self.record_change(id, patch).is_some())
    }

    /// Pointer released: commit the final geometry of the gesture.
    pub fn pointer_up(&self, id: ItemId, point: Point) -> bool {
        let patch = {
            let mut state = self.shared.lock();
            if state.closed {
                return false;
            }
            state.interactions.get_mut(&id).and_then(|interaction| interaction.pointer_up(point))
        };
        patch.is_some_and(|patch| self.record_change(id, patch).is_some())
    }

    /// Pointer capture lost: end the gesture at its last known position.
    pub fn pointer_cancel(&self, id: ItemId) -> bool {
        let patch = {
            let mut state = self.shared.lock();
            if state.closed {
                return false;
            }
            state.interactions.get_mut(&id).and_then(ItemInteraction::pointer_cancel)
        };
        patch.is_some_and(|patch| self.record_change(id, patch).is_some())
    }

    // ── Inline editing ───────────────────────────────────────────

    /// Open the inline editor on a note.
    pub fn begin_edit(&self, id: ItemId) -> bool {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        if state.closed {
            return false;
        }
        let Some(item) = state.items.iter().find(|item| item.id == id) else {
            return false;
        };
        let opened = state.interactions.entry(id).or_default().begin_edit(item);
        if opened {
            state.selection = Some(id);
        }
        opened
    }

    pub fn update_draft(&self, id: ItemId, content: Option<String>, time_label: Option<String>) -> bool {
        let mut state = self.shared.lock();
        state
            .interactions
            .get_mut(&id)
            .is_some_and(|interaction| interaction.update_draft(content, time_label))
    }

    /// Close the editor and save the fields that changed.
    ///
    /// `None` when nothing was recorded, including the no-op save.
    pub fn save_edit(&self, id: ItemId) -> Option<FlushPolicy> {
        let patch = {
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            if state.closed {
                return None;
            }
            let item = state.items.iter().find(|item| item.id == id)?;
            state.interactions.get_mut(&id)?.save_edit(item)
        };
        match patch {
            Some(patch) => self.record_change(id, patch),
            None => {
                debug!(item_id = %id, "edit closed without changes");
                None
            }
        }
    }

    /// Escape or blur: discard the draft.
    pub fn cancel_edit(&self, id: ItemId) -> bool {
        let mut state = self.shared.lock();
        match state.interactions.get_mut(&id) {
            Some(interaction) if interaction.is_editing() => interaction.cancel(),
            _ => false,
        }
    }

    // ── Changes ──────────────────────────────────────────────────

    /// Apply a patch locally and hand it to the coalescer.
    ///
    /// Geometry outside local invariants is clamped rather than rejected.
    /// Returns `None` when the item is unknown, the patch is empty, or the
    /// controller is closed.
    pub fn record_change(&self, id: ItemId, patch: ItemPatch) -> Option<FlushPolicy> {
        let patch = match patch.validate() {
            Ok(()) => patch,
            Err(error) => {
                debug!(item_id = %id, error = %error, "patch clamped");
                patch.sanitized()
            }
        };
        if patch.is_empty() {
            return None;
        }
        {
            let mut state = self.shared.lock();
            if state.closed || !state.apply_local(id, &patch) {
                return None;
            }
        }
        self.shared.coalescer.record_change(id, patch)
    }

    /// Send every pending write now.
    pub fn flush_pending(&self) {
        self.shared.coalescer.flush_all();
    }

    /// Create an item, then refresh so it arrives through reconciliation.
    ///
    /// `aspect_ratio` is the image's intrinsic width / height, if already known;
    /// it sizes an image created without an explicit size and is remembered
    /// for later resizes.
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid request (no network call is made),
    /// `Persistence` when the store rejects it (after notify + refresh),
    /// `Closed` after teardown. A failed follow-up refresh does not fail the
    /// create; it sends its own notice.
    pub async fn create_item(&self, mut request: NewItem, aspect_ratio: Option<f64>) -> Result<ItemId, EditorError> {
        if self.is_closed() {
            return Err(EditorError::Closed);
        }
        if let Err(error) = request.validate() {
            debug!(kind = ?request.kind, error = %error, "create request rejected locally");
            return Err(error.into());
        }
        request.size = Some(request.resolved_size(aspect_ratio));
        let kind = request.kind;

        let created = match self.shared.store.create_item(self.shared.board_id, request).await {
            Ok(item) => item,
            Err(error) => {
                warn!(kind = ?kind, error = %error, "create failed, refreshing");
                self.shared.notify(Notice::CreateFailed { message: error.to_string() });
                self.shared.refresh_after_failure().await;
                return Err(error.into());
            }
        };
        info!(item_id = %created.id, kind = ?kind, "item created");

        if let Some(ratio) = aspect_ratio.filter(|r| kind == ItemKind::Image && r.is_finite() && *r > 0.0) {
            self.shared.lock().aspect_ratios.insert(created.id, ratio);
        }
        if let Err(error) = self.refresh().await {
            debug!(item_id = %created.id, error = %error, "refresh after create did not complete");
        }
        Ok(created.id)
    }

    /// Remove an item optimistically, then delete it from the store.
    ///
    /// # Errors
    ///
    /// `Persistence` when the store rejects the delete; the item is restored
    /// by a refresh and a notice is sent before returning.
    pub async fn delete_item(&self, id: ItemId) -> Result<(), EditorError> {
        if self.is_closed() {
            return Err(EditorError::Closed);
        }
        if !self.shared.remove_local(id) {
            debug!(item_id = %id, "delete of unknown item");
        }
        self.shared.persist_delete(id).await
    }

    /// Fetch the authoritative list and reconcile it into local state.
    ///
    /// # Errors
    ///
    /// `Persistence` when the list call fails (a notice is also sent), or
    /// `Closed` after teardown.
    pub async fn refresh(&self) -> Result<(), EditorError> {
        self.shared.refresh().await
    }

    /// Refresh after `delay`, superseding any refresh already scheduled.
    pub fn schedule_refresh(&self, delay: Duration) {
        self.shared.schedule_refresh(delay);
    }

    // ── Keyboard ─────────────────────────────────────────────────

    pub fn set_text_focus(&self, focused: bool) {
        self.shared.lock().text_focused = focused;
    }

    pub fn set_shortcuts(&self, shortcuts: ShortcutTable) {
        self.shared.lock().shortcuts = shortcuts;
    }

    /// Resolve a key press against the shortcut table and run its command.
    ///
    /// Deletes run in the background; the item disappears locally before
    /// this returns.
    pub fn on_key_down(&self, key: &str, modifiers: Modifiers) -> KeyOutcome {
        let (outcome, selection) = {
            let state = self.shared.lock();
            if state.closed {
                return KeyOutcome::UNHANDLED;
            }
            (state.shortcuts.resolve(key, modifiers, state.text_focused), state.selection)
        };
        let Some(command) = outcome.command else {
            return outcome;
        };
        debug!(key, ?command, "shortcut");

        match command {
            Command::ClearSelection => {
                if let Some(id) = selection {
                    self.cancel_edit(id);
                }
                self.clear_selection();
            }
            Command::DeleteSelection => {
                if let Some(id) = selection {
                    self.spawn_delete(id);
                }
            }
            Command::CommitEdit => {
                if let Some(id) = selection {
                    self.save_edit(id);
                }
            }
            Command::FlushPending => self.flush_pending(),
        }
        outcome
    }

    fn spawn_delete(&self, id: ItemId) {
        if !self.shared.remove_local(id) {
            return;
        }
        let shared = self.shared.clone();
        tokio::spawn(async move {
            if let Err(error) = shared.persist_delete(id).await {
                debug!(item_id = %id, error = %error, "background delete failed");
            }
        });
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Cancel every timer and background task. Later input is ignored.
    pub fn teardown(&self) {
        let (refresh_timer, event_task) = {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.interactions.clear();
            (state.refresh_timer.take(), state.event_task.take())
        };
        for task in [refresh_timer, event_task].into_iter().flatten() {
            task.abort();
        }
        self.shared.coalescer.teardown();
        info!(board_id = %self.shared.board_id, "board controller torn down");
    }
}

impl Drop for BoardController {
    fn drop(&mut self) {
        self.teardown();
    }
}

