//! REST item store.
//!
//! Thin `reqwest` wrapper over the board API:
//!
//! | Call | Request |
//! |------|---------|
//! | `list_items` | `GET {base}/boards/{board_id}/items` |
//! | `create_item` | `POST {base}/boards/{board_id}/items` |
//! | `update_item` | `PATCH {base}/items/{id}` |
//! | `delete_item` | `DELETE {base}/items/{id}` |
//!
//! Status and body handling are pure functions so they can be tested without
//! a server.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::ItemStore;
use crate::config::{ApiConfig, HttpTimeouts};
use crate::error::PersistenceError;
use crate::item::{BoardId, Item, ItemId, ItemPatch, NewItem};

pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, PersistenceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| PersistenceError::Unavailable(format!("http client build failed: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, PersistenceError> {
        Self::new(config.base_url.clone(), config.timeouts)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), PersistenceError> {
        let response = request
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl ItemStore for HttpStore {
    async fn list_items(&self, board_id: BoardId) -> Result<Vec<Item>, PersistenceError> {
        let url = items_endpoint(&self.base_url, board_id);
        debug!(%url, "listing items");
        let (status, body) = self.send(self.http.get(&url)).await?;
        parse_body(check_status(status, body, None)?)
    }

    async fn create_item(&self, board_id: BoardId, request: NewItem) -> Result<Item, PersistenceError> {
        let url = items_endpoint(&self.base_url, board_id);
        let (status, body) = self.send(self.http.post(&url).json(&request)).await?;
        parse_body(check_status(status, body, None)?)
    }

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, PersistenceError> {
        let url = item_endpoint(&self.base_url, id);
        let (status, body) = self.send(self.http.patch(&url).json(patch)).await?;
        parse_body(check_status(status, body, Some(id))?)
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), PersistenceError> {
        let url = item_endpoint(&self.base_url, id);
        let (status, body) = self.send(self.http.delete(&url)).await?;
        check_status(status, body, Some(id)).map(|_| ())
    }
}

fn items_endpoint(base_url: &str, board_id: BoardId) -> String {
    format!("{base_url}/boards/{board_id}/items")
}

fn item_endpoint(base_url: &str, id: ItemId) -> String {
    format!("{base_url}/items/{id}")
}

/// Pass a 2xx body through; map 404 on a known item to `NotFound`, anything else to `Rejected`.
fn check_status(status: u16, body: String, item: Option<ItemId>) -> Result<String, PersistenceError> {
    match (status, item) {
        (200..=299, _) => Ok(body),
        (404, Some(id)) => Err(PersistenceError::NotFound(id)),
        _ => Err(PersistenceError::Rejected { status, body }),
    }
}

fn parse_body<T: DeserializeOwned>(body: String) -> Result<T, PersistenceError> {
    serde_json::from_str(&body).map_err(|e| PersistenceError::Decode(e.to_string()))
}
