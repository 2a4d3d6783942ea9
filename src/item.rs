//! Data model: board items, sparse patches, and creation requests.
//!
//! `Item` is what the controller holds and renders. `ItemPatch` is the sparse
//! update that flows from the interaction layer through the coalescer to the
//! store. `NewItem` is the creation request handed to the store, which assigns
//! the id.

#[cfg(test)]
#[path = "item_test.rs"]
mod item_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{
    IMAGE_DEFAULT_HEIGHT, IMAGE_DEFAULT_WIDTH, MIN_HEIGHT, MIN_WIDTH, NOTE_DEFAULT_HEIGHT, NOTE_DEFAULT_WIDTH,
};
use crate::error::ValidationError;
use crate::geometry::{Point, Size};

/// Unique identifier for an item, assigned by the store.
pub type ItemId = Uuid;

/// Unique identifier for a board.
pub type BoardId = Uuid;

/// What an item shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Free text.
    Note,
    /// An image referenced by URL.
    Image,
}

impl ItemKind {
    /// Default size for this kind when none is given.
    ///
    /// Images derive their height from `aspect_ratio` (width / height) when known.
    #[must_use]
    pub fn default_size(self, aspect_ratio: Option<f64>) -> Size {
        match self {
            Self::Note => Size::new(NOTE_DEFAULT_WIDTH, NOTE_DEFAULT_HEIGHT),
            Self::Image => match aspect_ratio.filter(|r| r.is_finite() && *r > 0.0) {
                Some(ratio) => Size::new(IMAGE_DEFAULT_WIDTH, IMAGE_DEFAULT_WIDTH / ratio).clamped(),
                None => Size::new(IMAGE_DEFAULT_WIDTH, IMAGE_DEFAULT_HEIGHT),
            },
        }
    }
}

/// A note or image placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Note text, or the image URL.
    pub content: String,
    /// Top-left corner in board-surface coordinates.
    pub position: Point,
    /// Absent until the item has been sized; see [`Item::effective_size`].
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub time_label: Option<String>,
}

impl Item {
    /// Size used for rendering and resizing: the stored size, or the kind default, floored.
    #[must_use]
    pub fn effective_size(&self) -> Size {
        self.size.unwrap_or_else(|| self.kind.default_size(None)).clamped()
    }

    /// Apply every present field of `patch`.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.size = Some(size);
        }
        if let Some(label) = &patch.time_label {
            self.time_label = if label.is_empty() { None } else { Some(label.clone()) };
        }
    }
}

/// Sparse update for an item. Only present fields are applied.
///
/// An empty `time_label` clears the label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_label: Option<String>,
}

impl ItemPatch {
    #[must_use]
    pub fn position(position: Point) -> Self {
        Self { position: Some(position), ..Default::default() }
    }

    #[must_use]
    pub fn geometry(position: Point, size: Size) -> Self {
        Self { position: Some(position), size: Some(size), ..Default::default() }
    }

    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Default::default() }
    }

    #[must_use]
    pub fn time_label(label: impl Into<String>) -> Self {
        Self { time_label: Some(label.into()), ..Default::default() }
    }

    /// No field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.position.is_none() && self.size.is_none() && self.time_label.is_none()
    }

    /// Touches a user-visible text field that must be saved without delay.
    #[must_use]
    pub fn is_urgent(&self) -> bool {
        self.content.is_some() || self.time_label.is_some()
    }

    /// Merge `later` into `self`, field by field; fields present in `later` win.
    pub fn merge(&mut self, later: ItemPatch) {
        if later.content.is_some() {
            self.content = later.content;
        }
        if later.position.is_some() {
            self.position = later.position;
        }
        if later.size.is_some() {
            self.size = later.size;
        }
        if later.time_label.is_some() {
            self.time_label = later.time_label;
        }
    }

    /// Check geometry fields against local invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(position) = self.position {
            if !position.x.is_finite() || !position.y.is_finite() {
                return Err(ValidationError::NonFinite("position"));
            }
        }
        if let Some(size) = self.size {
            if !size.width.is_finite() || !size.height.is_finite() {
                return Err(ValidationError::NonFinite("size"));
            }
            if !size.meets_floor() {
                return Err(ValidationError::BelowMinimumSize {
                    width: size.width,
                    height: size.height,
                    min_width: MIN_WIDTH,
                    min_height: MIN_HEIGHT,
                });
            }
        }
        Ok(())
    }

    /// Copy with geometry forced back inside local invariants.
    ///
    /// Non-finite positions are dropped; sizes are floored.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.position.is_some_and(|p| !p.x.is_finite() || !p.y.is_finite()) {
            self.position = None;
        }
        self.size = self.size.map(Size::clamped);
        self
    }
}

/// A request to create an item. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub kind: ItemKind,
    pub content: String,
    pub position: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_label: Option<String>,
}

impl NewItem {
    #[must_use]
    pub fn note(content: impl Into<String>, position: Point) -> Self {
        Self { kind: ItemKind::Note, content: content.into(), position, size: None, time_label: None }
    }

    #[must_use]
    pub fn image(url: impl Into<String>, position: Point) -> Self {
        Self { kind: ItemKind::Image, content: url.into(), position, size: None, time_label: None }
    }

    /// Explicit size, floored, or the kind default.
    #[must_use]
    pub fn resolved_size(&self, aspect_ratio: Option<f64>) -> Size {
        match self.size {
            Some(size) => size.clamped(),
            None => self.kind.default_size(aspect_ratio),
        }
    }

    /// # Errors
    ///
    /// Images need a URL; the position must be finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind == ItemKind::Image && self.content.trim().is_empty() {
            return Err(ValidationError::MissingField("content"));
        }
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(ValidationError::NonFinite("position"));
        }
        Ok(())
    }

    /// Materialize as an item with the given id, sizing it per [`NewItem::resolved_size`].
    #[must_use]
    pub fn into_item(self, id: ItemId) -> Item {
        let size = self.resolved_size(None);
        Item {
            id,
            kind: self.kind,
            content: self.content,
            position: self.position,
            size: Some(size),
            time_label: self.time_label.filter(|l| !l.is_empty()),
        }
    }
}
