//! Editor and API configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{DEBOUNCE_MS, REFRESH_DELAY_MS};
use crate::item::BoardId;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing config: env var {var} not set")]
    Missing { var: &'static str },

    /// A required environment variable could not be parsed.
    #[error("invalid config: {var}={value}")]
    Invalid { var: &'static str, value: String },
}

/// Timing knobs for the editing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// Trailing-edge debounce window for position/size writes.
    pub debounce: Duration,
    /// Delay before re-fetching the board after a content or time-label save.
    pub refresh_delay: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(DEBOUNCE_MS), refresh_delay: Duration::from_millis(REFRESH_DELAY_MS) }
    }
}

impl EditorConfig {
    /// Optional:
    /// - `BOARD_DEBOUNCE_MS`: default 300
    /// - `BOARD_REFRESH_DELAY_MS`: default 500
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            debounce: Duration::from_millis(env_parse("BOARD_DEBOUNCE_MS", DEBOUNCE_MS)),
            refresh_delay: Duration::from_millis(env_parse("BOARD_REFRESH_DELAY_MS", REFRESH_DELAY_MS)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Where the board API lives and which board to edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub board_id: BoardId,
    pub timeouts: HttpTimeouts,
}

impl ApiConfig {
    /// Required:
    /// - `BOARD_API_URL`
    /// - `BOARD_ID` (UUID)
    ///
    /// Optional:
    /// - `BOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BOARD_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("BOARD_API_URL").map_err(|_| ConfigError::Missing { var: "BOARD_API_URL" })?;
        let raw_board = std::env::var("BOARD_ID").map_err(|_| ConfigError::Missing { var: "BOARD_ID" })?;
        let board_id = parse_board_id(&raw_board)?;
        let timeouts = HttpTimeouts {
            request_secs: env_parse("BOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("BOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), board_id, timeouts })
    }
}

fn parse_board_id(raw: &str) -> Result<BoardId, ConfigError> {
    raw.trim()
        .parse::<BoardId>()
        .map_err(|_| ConfigError::Invalid { var: "BOARD_ID", value: raw.to_string() })
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(var = key, value = %raw, "invalid value, using default");
            default
        }
    }
}
