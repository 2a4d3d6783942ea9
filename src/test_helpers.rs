//! Shared fixtures for unit tests: item builders and a recording store.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use crate::error::PersistenceError;
use crate::geometry::{Point, Size};
use crate::item::{BoardId, Item, ItemId, ItemKind, ItemPatch, NewItem};
use crate::store::{ItemStore, MemoryStore};

/// A note at `(x, y)` with the given size.
#[must_use]
pub fn note_at(x: f64, y: f64, w: f64, h: f64) -> Item {
    Item {
        id: Uuid::new_v4(),
        kind: ItemKind::Note,
        content: "note".into(),
        position: Point::new(x, y),
        size: Some(Size::new(w, h)),
        time_label: None,
    }
}

/// An image at `(x, y)` with the given size.
#[must_use]
pub fn image_at(x: f64, y: f64, w: f64, h: f64) -> Item {
    Item {
        id: Uuid::new_v4(),
        kind: ItemKind::Image,
        content: "https://img.test/cat.png".into(),
        position: Point::new(x, y),
        size: Some(Size::new(w, h)),
        time_label: None,
    }
}

/// Let spawned tasks run, then advance virtual time by `ms`.
pub async fn advance(ms: u64) {
    settle().await;
    tokio::time::sleep(Duration::from_millis(ms)).await;
    settle().await;
}

/// Yield enough times for freshly spawned tasks to make progress.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// One call received by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List(BoardId),
    Create(NewItem),
    Update(ItemId, ItemPatch),
    Delete(ItemId),
}

#[derive(Default, Clone, Copy)]
struct Latency {
    list: Option<Duration>,
    update: Option<Duration>,
    delete: Option<Duration>,
}

#[derive(Default)]
struct Faults {
    list: usize,
    create: usize,
    update: usize,
    delete: usize,
}

/// `MemoryStore` wrapper that records calls and can fail or slow them down.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    faults: Mutex<Faults>,
    latency: Mutex<Latency>,
}

impl RecordingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn updates(&self) -> Vec<(ItemId, ItemPatch)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Update(id, patch) => Some((id, patch)),
                _ => None,
            })
            .collect()
    }

    pub fn list_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, StoreCall::List(_))).count()
    }

    pub fn fail_next_lists(&self, n: usize) {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).list = n;
    }

    pub fn fail_next_creates(&self, n: usize) {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).create = n;
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).update = n;
    }

    pub fn fail_next_deletes(&self, n: usize) {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).delete = n;
    }

    /// Make every update take `latency` of virtual time before it is applied.
    pub fn set_update_latency(&self, latency: Duration) {
        self.latency.lock().unwrap_or_else(PoisonError::into_inner).update = Some(latency);
    }

    /// Read the list right away but hold the response for `latency`.
    pub fn set_list_latency(&self, latency: Duration) {
        self.latency.lock().unwrap_or_else(PoisonError::into_inner).list = Some(latency);
    }

    /// Make every delete take `latency` of virtual time before it is applied.
    pub fn set_delete_latency(&self, latency: Duration) {
        self.latency.lock().unwrap_or_else(PoisonError::into_inner).delete = Some(latency);
    }

    fn latency(&self) -> Latency {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    fn take_fault(&self, pick: impl FnOnce(&mut Faults) -> &mut usize) -> Result<(), PersistenceError> {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        let remaining = pick(&mut *faults);
        if *remaining > 0 {
            *remaining -= 1;
            return Err(PersistenceError::Unavailable("simulated network error".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ItemStore for RecordingStore {
    async fn list_items(&self, board_id: BoardId) -> Result<Vec<Item>, PersistenceError> {
        self.record(StoreCall::List(board_id));
        self.take_fault(|f| &mut f.list)?;
        let items = self.inner.list_items(board_id).await;
        if let Some(latency) = self.latency().list {
            tokio::time::sleep(latency).await;
        }
        items
    }

    async fn create_item(&self, board_id: BoardId, request: NewItem) -> Result<Item, PersistenceError> {
        self.record(StoreCall::Create(request.clone()));
        self.take_fault(|f| &mut f.create)?;
        self.inner.create_item(board_id, request).await
    }

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, PersistenceError> {
        self.record(StoreCall::Update(id, patch.clone()));
        if let Some(latency) = self.latency().update {
            tokio::time::sleep(latency).await;
        }
        self.take_fault(|f| &mut f.update)?;
        self.inner.update_item(id, patch).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), PersistenceError> {
        self.record(StoreCall::Delete(id));
        if let Some(latency) = self.latency().delete {
            tokio::time::sleep(latency).await;
        }
        self.take_fault(|f| &mut f.delete)?;
        self.inner.delete_item(id).await
    }
}
