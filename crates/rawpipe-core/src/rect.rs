//! Rectangle type for regions of interest.
//!
//! Requests travelling down a filter graph may carry a region of interest
//! that is partly (or entirely) outside the image, for example when a
//! preview canvas scrolls past the frame edge. [`Rect`] therefore uses
//! signed coordinates and is clamped against the image size where needed.
//!
//! # Coordinate System
//!
//! ```text
//! (0,0) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │  Region  │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! # Usage
//!
//! ```rust
//! use rawpipe_core::Rect;
//!
//! let roi = Rect::new(-5, -5, 20, 20);
//! assert_eq!(roi.clamp_to(10, 10), Some(Rect::new(0, 0, 10, 10)));
//! ```

use serde::{Deserialize, Serialize};

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// Left/top edges are inclusive, right/bottom edges exclusive. A rectangle
/// with a non-positive width or height is empty. Edges that would pass the
/// `i32` range saturate at `i32::MIN`/`i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at (0, 0) covering `width` x `height`.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// X coordinate of the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Y coordinate of the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Area in pixels; zero for empty rectangles.
    #[inline]
    pub const fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    /// Returns `true` if either dimension is zero or negative.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the point (px, py) is inside this rectangle.
    #[inline]
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns `true` if this rectangle fully contains `other`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rawpipe_core::Rect;
    ///
    /// let outer = Rect::new(0, 0, 100, 100);
    /// assert!(outer.contains_rect(&Rect::new(10, 10, 50, 50)));
    /// assert!(!outer.contains_rect(&Rect::new(-1, 10, 50, 50)));
    /// ```
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the intersection with `other`, or `None` if they don't overlap.
    #[inline]
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, span(x, right), span(y, bottom)))
        } else {
            None
        }
    }

    /// Returns the bounding box containing both rectangles.
    ///
    /// Empty rectangles are ignored.
    #[inline]
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, span(x, right), span(y, bottom))
    }

    /// Returns this rectangle translated by (dx, dy).
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Clamps this rectangle to an image of `width` x `height`.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image.
    #[inline]
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersect(&Rect::from_size(width, height))
    }

    /// Returns `true` if the rectangle already lies inside a
    /// `width` x `height` image.
    #[inline]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        Rect::from_size(width, height).contains_rect(self)
    }

    /// Scales origin and size by `sx`/`sy`, rounding outwards so the
    /// result always covers the scaled area.
    pub fn scale(&self, sx: f64, sy: f64) -> Rect {
        let x0 = (self.x as f64 * sx).floor() as i32;
        let y0 = (self.y as f64 * sy).floor() as i32;
        let x1 = (self.right() as f64 * sx).ceil() as i32;
        let y1 = (self.bottom() as f64 * sy).ceil() as i32;
        Rect::new(x0, y0, span(x0, x1), span(y0, y1))
    }
}

/// `hi - lo`, saturated to the `i32` range.
#[inline]
fn span(lo: i32, hi: i32) -> i32 {
    (hi as i64 - lo as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rect({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}
