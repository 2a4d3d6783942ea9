//! Per-item interaction state machine: pointer gestures and inline editing.
//!
//! Each item owns one [`ItemInteraction`]. It decides which pointer and
//! keyboard events apply in its current state and turns the applicable ones
//! into [`ItemPatch`]es via the geometry engine. It never talks to the store;
//! the controller applies the returned patches locally and hands them to the
//! coalescer.
//!
//! ```text
//! Idle ──pointer-down(body, note)──────────▶ Editing ──save/escape/blur──▶ Idle
//! Idle ──pointer-down(drag affordance)─────▶ Dragging ──up/cancel────────▶ Idle
//! Idle ──pointer-down(resize handle)───────▶ Resizing ──up/cancel────────▶ Idle
//! ```

#[cfg(test)]
#[path = "interaction_test.rs"]
mod interaction_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, ResizeHandle, anchor_size, apply_drag, apply_resize};
use crate::item::{Item, ItemKind, ItemPatch};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS. Turns a note click into a move.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// Which part of an item the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The item body.
    Body,
    /// The dedicated move affordance.
    DragHandle,
    /// One of the eight resize affordances.
    Resize(ResizeHandle),
}

/// A pointer-down delivered to one item.
#[derive(Debug, Clone, Copy)]
pub struct PointerDown {
    pub target: PointerTarget,
    /// Board-surface coordinates.
    pub point: Point,
    pub button: Button,
    pub modifiers: Modifiers,
}

/// State after a pointer-down was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// The event does not apply in the current state.
    Ignored,
    Editing,
    Dragging,
    Resizing,
}

/// Context captured when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Pointer position at pointer-down.
    pub pointer_origin: Point,
    /// Item position at pointer-down.
    pub origin: Point,
    /// Most recent pointer position.
    pub last_pointer: Point,
}

/// Context captured when a resize starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    pub handle: ResizeHandle,
    pub pointer_origin: Point,
    /// Item bounds at pointer-down.
    pub origin: Bounds,
    /// Intrinsic width / height, for images whose ratio is known.
    pub aspect_ratio: Option<f64>,
    pub last_pointer: Point,
}

/// Uncommitted values in the inline edit form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditDraft {
    pub content: String,
    pub time_label: String,
}

/// Current interaction for one item. Variants are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Editing(EditDraft),
    Dragging(DragSession),
    Resizing(ResizeSession),
}

/// Interaction state machine for a single item.
#[derive(Debug, Clone, Default)]
pub struct ItemInteraction {
    state: InteractionState,
}

impl ItemInteraction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self.state, InteractionState::Editing(_))
    }

    /// Dragging or resizing.
    #[must_use]
    pub fn is_gesturing(&self) -> bool {
        matches!(self.state, InteractionState::Dragging(_) | InteractionState::Resizing(_))
    }

    /// The open edit draft, if editing.
    #[must_use]
    pub fn draft(&self) -> Option<&EditDraft> {
        match &self.state {
            InteractionState::Editing(draft) => Some(draft),
            _ => None,
        }
    }

    /// Start a gesture or open the editor, depending on target, item kind, and modifiers.
    ///
    /// Only the primary button from `Idle` is accepted. A note body opens the
    /// editor unless Ctrl/Command is held, which moves it instead; an image
    /// body and the drag affordance always move; resize handles resize.
    pub fn pointer_down(&mut self, item: &Item, aspect_ratio: Option<f64>, event: PointerDown) -> PointerOutcome {
        if event.button != Button::Primary || !self.is_idle() {
            return PointerOutcome::Ignored;
        }

        match event.target {
            PointerTarget::Resize(handle) => {
                self.state = InteractionState::Resizing(ResizeSession {
                    handle,
                    pointer_origin: event.point,
                    origin: Bounds { position: item.position, size: item.effective_size() },
                    aspect_ratio: if item.kind == ItemKind::Image { aspect_ratio } else { None },
                    last_pointer: event.point,
                });
                PointerOutcome::Resizing
            }
            PointerTarget::Body if item.kind == ItemKind::Note && !event.modifiers.command() => {
                self.begin_edit(item);
                PointerOutcome::Editing
            }
            PointerTarget::Body | PointerTarget::DragHandle => {
                self.state = InteractionState::Dragging(DragSession {
                    pointer_origin: event.point,
                    origin: item.position,
                    last_pointer: event.point,
                });
                PointerOutcome::Dragging
            }
        }
    }

    /// Geometry for the pointer's new position, computed from the session origin.
    ///
    /// `None` when no gesture is active.
    pub fn pointer_move(&mut self, point: Point) -> Option<ItemPatch> {
        match &mut self.state {
            InteractionState::Dragging(session) => {
                session.last_pointer = point;
                Some(drag_patch(session, point))
            }
            InteractionState::Resizing(session) => {
                session.last_pointer = point;
                let bounds = resize_bounds(session, point);
                Some(ItemPatch::geometry(bounds.position, bounds.size))
            }
            _ => None,
        }
    }

    /// End the gesture and return the final geometry.
    ///
    /// Resizes are committed with width and height rounded to whole units.
    pub fn pointer_up(&mut self, point: Point) -> Option<ItemPatch> {
        let patch = match &self.state {
            InteractionState::Dragging(session) => drag_patch(session, point),
            InteractionState::Resizing(session) => {
                let bounds = resize_bounds(session, point);
                let rounded = anchor_size(session.handle, session.origin, bounds.size.rounded());
                ItemPatch::geometry(rounded.position, rounded.size)
            }
            _ => return None,
        };
        self.state = InteractionState::Idle;
        Some(patch)
    }

    /// Pointer capture was lost: end the gesture at the last known pointer position.
    pub fn pointer_cancel(&mut self) -> Option<ItemPatch> {
        let last = match &self.state {
            InteractionState::Dragging(session) => session.last_pointer,
            InteractionState::Resizing(session) => session.last_pointer,
            _ => return None,
        };
        self.pointer_up(last)
    }

    /// Open the inline editor seeded from the item. Notes only, from `Idle` only.
    pub fn begin_edit(&mut self, item: &Item) -> bool {
        if item.kind != ItemKind::Note || !self.is_idle() {
            return false;
        }
        self.state = InteractionState::Editing(EditDraft {
            content: item.content.clone(),
            time_label: item.time_label.clone().unwrap_or_default(),
        });
        true
    }

    /// Change the draft without touching the item. `false` when not editing.
    pub fn update_draft(&mut self, content: Option<String>, time_label: Option<String>) -> bool {
        let InteractionState::Editing(draft) = &mut self.state else {
            return false;
        };
        if let Some(content) = content {
            draft.content = content;
        }
        if let Some(time_label) = time_label {
            draft.time_label = time_label;
        }
        true
    }

    /// Close the editor and return a patch with only the fields that changed.
    ///
    /// `None` when not editing or when nothing changed.
    pub fn save_edit(&mut self, item: &Item) -> Option<ItemPatch> {
        if !self.is_editing() {
            return None;
        }
        let InteractionState::Editing(draft) = std::mem::take(&mut self.state) else {
            return None;
        };

        let mut patch = ItemPatch::default();
        if draft.content != item.content {
            patch.content = Some(draft.content);
        }
        if draft.time_label != item.time_label.clone().unwrap_or_default() {
            patch.time_label = Some(draft.time_label);
        }
        (!patch.is_empty()).then_some(patch)
    }

    /// Escape or blur: discard the draft without saving. Gestures end where
    /// they are; their geometry was already recorded on every move.
    ///
    /// Returns whether anything was active.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        self.state = InteractionState::Idle;
        was_active
    }
}

fn drag_patch(session: &DragSession, point: Point) -> ItemPatch {
    ItemPatch::position(apply_drag(session.origin, point.delta_from(session.pointer_origin)))
}

fn resize_bounds(session: &ResizeSession, point: Point) -> Bounds {
    apply_resize(session.handle, session.origin, point.delta_from(session.pointer_origin), session.aspect_ratio)
}
