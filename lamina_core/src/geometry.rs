// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer pixel geometry for layer placement.
//!
//! Layer origins and sizes live on the window's pixel grid, so they are
//! integers. Hit-testing and draw areas are expressed with [`kurbo`] types
//! in floating point, since touch coordinates arrive as `f64`.

use core::fmt;

use kurbo::{Point, Rect, Size};

/// A position on the window pixel grid (origin at the top-left corner).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntPoint {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels, growing downwards.
    pub y: i32,
}

impl IntPoint {
    /// The point `(0, 0)`.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncates a floating-point position to the pixel grid.
    ///
    /// Fractions are discarded towards zero, matching how touch positions
    /// are quantized before deltas are computed.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "window coordinates fit in i32; truncation is the intent"
    )]
    pub fn from_point_trunc(p: Point) -> Self {
        Self {
            x: p.x as i32,
            y: p.y as i32,
        }
    }

    /// Returns this point moved by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Converts to a [`kurbo::Point`].
    #[inline]
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

impl fmt::Debug for IntPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<[i32; 2]> for IntPoint {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// A size in pixels.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl IntSize {
    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width as the signed integer GL entry points take.
    #[inline]
    #[must_use]
    pub fn width_i32(self) -> i32 {
        i32::try_from(self.width).unwrap_or(i32::MAX)
    }

    /// Height as the signed integer GL entry points take.
    #[inline]
    #[must_use]
    pub fn height_i32(self) -> i32 {
        i32::try_from(self.height).unwrap_or(i32::MAX)
    }

    /// Number of pixels covered, or `None` if it does not fit in `usize`.
    #[inline]
    #[must_use]
    pub const fn area(self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }
}

impl fmt::Debug for IntSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[u32; 2]> for IntSize {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

/// Returns the screen-space rectangle covered by `size` placed at `origin`.
#[must_use]
pub fn draw_area(origin: IntPoint, size: IntSize) -> Rect {
    let size = Size::new(f64::from(size.width), f64::from(size.height));
    Rect::from_origin_size(origin.to_point(), size)
}

/// Inclusive containment test: points on any edge of `rect` count as inside.
///
/// [`Rect::contains`] treats the far edges as outside, which would make a
/// touch on the last pixel row or column miss the layer.
#[inline]
#[must_use]
pub fn contains_inclusive(rect: Rect, p: Point) -> bool {
    rect.x0 <= p.x && p.x <= rect.x1 && rect.y0 <= p.y && p.y <= rect.y1
}
