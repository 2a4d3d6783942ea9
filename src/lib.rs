//! Optimistic, debounced editing engine for a board of notes and images.
//!
//! User edits are applied to the local item list immediately and persisted
//! in the background: text edits right away, geometry edits after a short
//! per-item debounce window. Fresh snapshots from the backend are merged in
//! without snapping back geometry the user has not finished saving.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | [`controller::BoardController`]: item list, selection, notices, teardown |
//! | [`interaction`] | Per-item pointer/edit state machine |
//! | [`geometry`] | Drag and eight-handle resize math |
//! | [`coalescer`] | Per-item pending patches and the dual-latency flush policy |
//! | [`reconcile`] | Snapshot merge that preserves local geometry |
//! | [`shortcuts`] | Declarative keyboard shortcut table |
//! | [`store`] | Persistence trait plus REST and in-memory backends |
//! | [`item`] | Items, patches, and creation requests |
//! | [`error`] | Validation and persistence errors |
//! | [`config`] | Environment-driven configuration |
//! | [`consts`] | Size floors, default sizes, timing constants |

pub mod coalescer;
pub mod config;
pub mod consts;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod item;
pub mod reconcile;
pub mod shortcuts;
pub mod store;

#[cfg(test)]
mod test_helpers;
