//! Persistence capability consumed by the editing engine.
//!
//! DESIGN
//! ======
//! The engine is transport-agnostic: everything it needs from a backend is
//! the four calls on [`ItemStore`]. `HttpStore` speaks to a REST API,
//! `MemoryStore` keeps items in process. Failures of any kind surface as
//! [`PersistenceError`]; the engine only reads their messages.

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::MemoryStore;

use crate::error::PersistenceError;
use crate::item::{BoardId, Item, ItemId, ItemPatch, NewItem};

/// Storage backend for board items.
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// All items on a board.
    async fn list_items(&self, board_id: BoardId) -> Result<Vec<Item>, PersistenceError>;

    /// Create an item; the store assigns its id.
    async fn create_item(&self, board_id: BoardId, request: NewItem) -> Result<Item, PersistenceError>;

    /// Apply a sparse patch and return the stored item.
    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, PersistenceError>;

    /// Remove an item.
    async fn delete_item(&self, id: ItemId) -> Result<(), PersistenceError>;
}
