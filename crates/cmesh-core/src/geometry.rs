#![forbid(unsafe_code)]

//! Geometric primitives for the floating coordinate space.
//!
//! All coordinates are viewport pixels stored as `f64`. Layout observers in a
//! browser or native host report fractional values, so nothing here rounds
//! implicitly; grid snapping is an explicit step.
//!
//! # Failure Modes
//!
//! Every function in this module is total. Degenerate input (zero or negative
//! extents, NaN, infinities) never panics and never propagates NaN into an
//! overlap result: it degrades to "no overlap" so that callers evaluating drop
//! targets mid-drag always get a usable answer.

use serde::{Deserialize, Serialize};

/// A point in the floating coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise difference `self - origin`.
    #[inline]
    #[must_use]
    pub fn delta_from(self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }

    /// Translate by a delta.
    #[inline]
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Snap both coordinates to `grid` independently.
    #[inline]
    #[must_use]
    pub fn snapped(self, grid: f64) -> Self {
        Self::new(snap_to_grid(self.x, grid), snap_to_grid(self.y, grid))
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Width and height of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Area, or 0 for degenerate sizes.
    #[inline]
    #[must_use]
    pub fn area(self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width * self.height
        }
    }

    /// True when either extent is non-positive or not finite.
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

impl From<(f64, f64)> for Size {
    fn from((width, height): (f64, f64)) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in viewport coordinates.
///
/// `x`/`y` is the top-left corner; `right()`/`bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from its top-left corner and size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Extent of the rectangle.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Geometric center.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Area, or 0 for empty rectangles.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.size().area()
    }

    /// True when all four components are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// True when the rectangle has no usable area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.x.is_finite() || !self.y.is_finite() || self.size().is_empty()
    }

    /// Check if a point lies inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Move the rectangle by a delta.
    #[inline]
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Compute the intersection with another rectangle, returning `None` if
    /// there is no positive-area overlap.
    #[must_use]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Area of the intersection of `a` and `b`; 0 when they do not overlap or
/// either is degenerate.
#[must_use]
pub fn rect_overlap_area(a: &Rect, b: &Rect) -> f64 {
    a.intersection_opt(b).map_or(0.0, |overlap| overlap.area())
}

/// Fraction of `item` covered by `zone`, in `[0, 1]`.
///
/// Normalised by the item's area, not the zone's, so a small item fully
/// inside a large zone yields exactly `1.0`.
#[must_use]
pub fn overlap_fraction(item: &Rect, zone: &Rect) -> f64 {
    let item_area = item.area();
    if item_area <= 0.0 {
        return 0.0;
    }
    let fraction = rect_overlap_area(item, zone) / item_area;
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Round `value` to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid disables snapping, as does a
/// non-finite value. Values whose snapped result would overflow are
/// returned unchanged.
#[must_use]
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    if !value.is_finite() || !grid_size.is_finite() || grid_size <= 0.0 {
        return value;
    }
    let snapped = (value / grid_size).round() * grid_size;
    if snapped.is_finite() { snapped } else { value }
}
