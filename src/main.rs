//! `corkboard`: load one board through the editing engine and print it as JSON.
//!
//! Reads `BOARD_API_URL` and `BOARD_ID` (a `.env` file is honored). With
//! `--offline` an empty in-memory store is used instead of the REST API.

use std::error::Error;
use std::sync::Arc;

use corkboard::config::{ApiConfig, EditorConfig};
use corkboard::controller::BoardController;
use corkboard::store::{HttpStore, ItemStore, MemoryStore};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            return Err(error.into());
        }
    }
    tracing_subscriber::fmt::init();

    let offline = std::env::args().skip(1).any(|arg| arg == "--offline");
    let (board_id, store): (_, Arc<dyn ItemStore>) = if offline {
        (Uuid::new_v4(), Arc::new(MemoryStore::new()))
    } else {
        let api = ApiConfig::from_env()?;
        (api.board_id, Arc::new(HttpStore::from_config(&api)?))
    };

    let (board, mut notices) = BoardController::new(board_id, store, EditorConfig::from_env());
    let result = board.refresh().await;
    board.teardown();

    while let Ok(notice) = notices.try_recv() {
        tracing::warn!(notice = notice.message(), "board notice");
    }
    result?;

    println!("{}", serde_json::to_string_pretty(&board.items())?);
    Ok(())
}
