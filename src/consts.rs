//! Shared numeric constants for the board editor.

// ── Resize floor ────────────────────────────────────────────────

/// Smallest width any item may be resized to, in board units.
pub const MIN_WIDTH: f64 = 100.0;

/// Smallest height any item may be resized to, in board units.
pub const MIN_HEIGHT: f64 = 50.0;

// ── Default sizes ───────────────────────────────────────────────

/// Width given to a note created without an explicit size.
pub const NOTE_DEFAULT_WIDTH: f64 = 300.0;

/// Height given to a note created without an explicit size.
pub const NOTE_DEFAULT_HEIGHT: f64 = 150.0;

/// Width given to an image created without an explicit size.
pub const IMAGE_DEFAULT_WIDTH: f64 = 400.0;

/// Height given to an image created without an explicit size or known aspect ratio.
pub const IMAGE_DEFAULT_HEIGHT: f64 = 300.0;

// ── Timing ──────────────────────────────────────────────────────

/// Trailing-edge debounce window for position/size writes, in milliseconds.
pub const DEBOUNCE_MS: u64 = 300;

/// Delay before re-fetching the board after a content or time-label save, in milliseconds.
pub const REFRESH_DELAY_MS: u64 = 500;
