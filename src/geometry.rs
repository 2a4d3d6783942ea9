//! Geometry engine: pure drag and resize math on board-surface coordinates.
//!
//! All functions here are deterministic and take their inputs by value.
//! Callers pass the geometry captured when the pointer session started, not
//! the live item, so repeated calls during one gesture never accumulate drift.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MIN_HEIGHT, MIN_WIDTH};

/// A point or offset on the board surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - origin`.
    #[must_use]
    pub fn delta_from(self, origin: Point) -> Point {
        Point { x: self.x - origin.x, y: self.y - origin.y }
    }

    /// Replace non-finite components with zero.
    #[must_use]
    pub fn finite_or_zero(self) -> Point {
        Point { x: finite_or(self.x, 0.0), y: finite_or(self.y, 0.0) }
    }
}

/// Width and height of an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions satisfy the resize floor.
    #[must_use]
    pub fn meets_floor(self) -> bool {
        self.width >= MIN_WIDTH && self.height >= MIN_HEIGHT
    }

    /// Raise each dimension to its floor. Non-finite values collapse to the floor.
    #[must_use]
    pub fn clamped(self) -> Size {
        Size {
            width: finite_or(self.width, MIN_WIDTH).max(MIN_WIDTH),
            height: finite_or(self.height, MIN_HEIGHT).max(MIN_HEIGHT),
        }
    }

    /// Round both dimensions to whole units.
    #[must_use]
    pub fn rounded(self) -> Size {
        Size { width: self.width.round(), height: self.height.round() }
    }
}

/// Position plus size: everything a resize can change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub position: Point,
    pub size: Size,
}

/// One of the eight resize affordances around an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    /// All handles, clockwise from north.
    pub const ALL: [ResizeHandle; 8] = [
        Self::N,
        Self::Ne,
        Self::E,
        Self::Se,
        Self::S,
        Self::Sw,
        Self::W,
        Self::Nw,
    ];

    /// Whether this is a single-axis edge handle (`n`, `e`, `s`, `w`).
    #[must_use]
    pub fn is_edge(self) -> bool {
        matches!(self, Self::N | Self::E | Self::S | Self::W)
    }

    fn rule(self) -> HandleRule {
        HANDLE_RULES[self as usize]
    }
}

/// How a handle maps pointer deltas onto width, height, and position.
#[derive(Debug, Clone, Copy)]
struct HandleRule {
    /// Multiplier for `dx` into width: `1` grows right, `-1` grows left, `0` ignores x.
    dx_to_width: f64,
    /// Multiplier for `dy` into height: `1` grows down, `-1` grows up, `0` ignores y.
    dy_to_height: f64,
    /// Left edge moves, so x shifts to keep the right edge fixed.
    shifts_x: bool,
    /// Top edge moves, so y shifts to keep the bottom edge fixed.
    shifts_y: bool,
}

const fn rule(dx_to_width: f64, dy_to_height: f64, shifts_x: bool, shifts_y: bool) -> HandleRule {
    HandleRule { dx_to_width, dy_to_height, shifts_x, shifts_y }
}

/// Indexed by `ResizeHandle` discriminant; order must match the enum.
const HANDLE_RULES: [HandleRule; 8] = [
    rule(0.0, -1.0, false, true),  // N
    rule(1.0, -1.0, false, true),  // Ne
    rule(1.0, 0.0, false, false),  // E
    rule(1.0, 1.0, false, false),  // Se
    rule(0.0, 1.0, false, false),  // S
    rule(-1.0, 1.0, true, false),  // Sw
    rule(-1.0, 0.0, true, false),  // W
    rule(-1.0, -1.0, true, true),  // Nw
];

/// New position after dragging by `pointer_delta` from `origin`. Unbounded.
#[must_use]
pub fn apply_drag(origin: Point, pointer_delta: Point) -> Point {
    let delta = pointer_delta.finite_or_zero();
    Point { x: origin.x + delta.x, y: origin.y + delta.y }
}

/// New bounds after dragging `handle` by `pointer_delta` from `origin`.
///
/// Both dimensions are floored at the minimum size. When `aspect_ratio`
/// (width / height) is given and the handle is a pure edge handle, the cross
/// axis is recomputed from the ratio after flooring; corner handles resize
/// freely. Handles that move the top or left edge shift the position so the
/// opposite edge stays where it was.
#[must_use]
pub fn apply_resize(handle: ResizeHandle, origin: Bounds, pointer_delta: Point, aspect_ratio: Option<f64>) -> Bounds {
    let delta = pointer_delta.finite_or_zero();
    let rule = handle.rule();

    let mut size = Size {
        width: origin.size.width + rule.dx_to_width * delta.x,
        height: origin.size.height + rule.dy_to_height * delta.y,
    }
    .clamped();

    if let Some(ratio) = aspect_ratio.filter(|r| r.is_finite() && *r > 0.0) {
        if handle.is_edge() {
            size = lock_cross_axis(handle, size, ratio);
        }
    }

    anchor_size(handle, origin, size)
}

/// Place `size` so the edges `handle` does not move stay where they were in `origin`.
#[must_use]
pub fn anchor_size(handle: ResizeHandle, origin: Bounds, size: Size) -> Bounds {
    let rule = handle.rule();
    let mut position = origin.position;
    if rule.shifts_x {
        position.x = origin.position.x + origin.size.width - size.width;
    }
    if rule.shifts_y {
        position.y = origin.position.y + origin.size.height - size.height;
    }
    Bounds { position, size }
}

/// Derive the dimension the edge handle does not drive from `ratio`.
///
/// If the derived dimension would fall below its floor, it is floored and the
/// driven dimension grows to keep the ratio.
fn lock_cross_axis(handle: ResizeHandle, size: Size, ratio: f64) -> Size {
    match handle {
        ResizeHandle::E | ResizeHandle::W => {
            let height = size.width / ratio;
            if height < MIN_HEIGHT {
                Size { width: MIN_HEIGHT * ratio, height: MIN_HEIGHT }
            } else {
                Size { width: size.width, height }
            }
        }
        _ => {
            let width = size.height * ratio;
            if width < MIN_WIDTH {
                Size { width: MIN_WIDTH, height: MIN_WIDTH / ratio }
            } else {
                Size { width, height: size.height }
            }
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
