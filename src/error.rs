//! Error taxonomy for the editing engine.
//!
//! ERROR HANDLING
//! ==============
//! `ValidationError` never reaches the user: geometry is clamped and invalid
//! creation requests are dropped locally. `PersistenceError` is the single
//! error type every store call returns; the controller converts it into a
//! refresh plus a user-visible notice at the call site.

use crate::item::ItemId;

/// A local invariant would be violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A size fell below the resize floor.
    #[error("size {width}x{height} is below the {min_width}x{min_height} floor")]
    BelowMinimumSize { width: f64, height: f64, min_width: f64, min_height: f64 },

    /// A required field was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A coordinate or dimension was NaN or infinite.
    #[error("non-finite {0}")]
    NonFinite(&'static str),
}

/// A call to the persistence collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The request never got a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The item does not exist on the backend.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// The backend is unavailable for another reason.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned from the controller's async entry points.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The controller was torn down.
    #[error("board editor is closed")]
    Closed,
}
