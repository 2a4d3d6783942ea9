//! In-process item store.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::ItemStore;
use crate::error::PersistenceError;
use crate::item::{BoardId, Item, ItemId, ItemPatch, NewItem};

/// Items kept in memory, in creation order.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<Vec<(BoardId, Item)>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a board with existing items, keeping their ids.
    pub async fn seed(&self, board_id: BoardId, items: Vec<Item>) {
        let mut stored = self.items.write().await;
        stored.extend(items.into_iter().map(|item| (board_id, item)));
    }

    /// Stored copy of an item, if present.
    pub async fn get(&self, id: ItemId) -> Option<Item> {
        let stored = self.items.read().await;
        stored
            .iter()
            .find(|(_, item)| item.id == id)
            .map(|(_, item)| item.clone())
    }
}

#[async_trait::async_trait]
impl ItemStore for MemoryStore {
    async fn list_items(&self, board_id: BoardId) -> Result<Vec<Item>, PersistenceError> {
        let stored = self.items.read().await;
        Ok(stored
            .iter()
            .filter(|(board, _)| *board == board_id)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn create_item(&self, board_id: BoardId, request: NewItem) -> Result<Item, PersistenceError> {
        let item = request.into_item(Uuid::new_v4());
        let mut stored = self.items.write().await;
        stored.push((board_id, item.clone()));
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, PersistenceError> {
        let mut stored = self.items.write().await;
        let Some((_, item)) = stored.iter_mut().find(|(_, item)| item.id == id) else {
            return Err(PersistenceError::NotFound(id));
        };
        item.apply(patch);
        Ok(item.clone())
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), PersistenceError> {
        let mut stored = self.items.write().await;
        let before = stored.len();
        stored.retain(|(_, item)| item.id != id);
        if stored.len() == before {
            return Err(PersistenceError::NotFound(id));
        }
        Ok(())
    }
}
