//! Foundation types: rounding helpers and rectangles.
//!
//! Rectangles are half-open: a `Rect` covers `x1 <= x < x2` and
//! `y1 <= y < y2`. A rectangle with `x1 >= x2` or `y1 >= y2` is empty but
//! still keeps its position, which matters for bounds algebra (an empty
//! intersection reports where the sources met).

use core::ops::{Add, Sub};

// ============================================================================
// Rounding and conversion functions
// ============================================================================

/// Round a double to the nearest integer (round half away from zero).
#[inline]
pub fn iround(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

/// Round a double to the nearest unsigned integer (round half up).
#[inline]
pub fn uround(v: f64) -> u32 {
    (v + 0.5) as u32
}

/// Floor a double to the nearest integer toward negative infinity.
#[inline]
pub fn ifloor(v: f64) -> i32 {
    let i = v as i32;
    i - (i as f64 > v) as i32
}

/// Ceiling of a double as a signed integer.
#[inline]
pub fn iceil(v: f64) -> i32 {
    v.ceil() as i32
}

/// Align `v` down to the nearest multiple of `period` (toward negative
/// infinity). `period` must be positive.
#[inline]
pub fn align_down(v: i32, period: i32) -> i32 {
    v.div_euclid(period) * period
}

// ============================================================================
// Rect
// ============================================================================

/// A half-open rectangle defined by two corner points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect<T: Copy> {
    pub x1: T,
    pub y1: T,
    pub x2: T,
    pub y2: T,
}

impl<T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T>> Rect<T> {
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from an origin and a size.
    pub fn from_xywh(x: T, y: T, w: T, h: T) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    pub fn width(&self) -> T {
        self.x2 - self.x1
    }

    pub fn height(&self) -> T {
        self.y2 - self.y1
    }

    /// Returns `true` if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.x1 < self.x2 && self.y1 < self.y2)
    }

    /// Returns `true` if the two rectangles share a region of positive area.
    pub fn intersects(&self, r: &Self) -> bool {
        !self.is_empty()
            && !r.is_empty()
            && r.x1 < self.x2
            && self.x1 < r.x2
            && r.y1 < self.y2
            && self.y1 < r.y2
    }

    /// Returns `true` if `r` lies entirely within this rectangle.
    pub fn contains_rect(&self, r: &Self) -> bool {
        r.x1 >= self.x1 && r.y1 >= self.y1 && r.x2 <= self.x2 && r.y2 <= self.y2
    }

    /// Returns `true` if the point (x, y) is inside the rectangle.
    pub fn hit_test(&self, x: T, y: T) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Clip this rectangle to the intersection with `r`.
    /// Returns `true` if the result is non-empty.
    pub fn clip(&mut self, r: &Self) -> bool {
        *self = intersect_rectangles(self, r);
        !self.is_empty()
    }
}

/// Compute the intersection of two rectangles. The result may be empty
/// (or even inverted) when they do not overlap; check with `is_empty`.
pub fn intersect_rectangles<T: Copy + PartialOrd>(r1: &Rect<T>, r2: &Rect<T>) -> Rect<T> {
    let mut r = *r1;
    if r.x2 > r2.x2 {
        r.x2 = r2.x2;
    }
    if r.y2 > r2.y2 {
        r.y2 = r2.y2;
    }
    if r.x1 < r2.x1 {
        r.x1 = r2.x1;
    }
    if r.y1 < r2.y1 {
        r.y1 = r2.y1;
    }
    r
}

/// Compute the union (bounding box) of two rectangles.
pub fn unite_rectangles<T: Copy + PartialOrd>(r1: &Rect<T>, r2: &Rect<T>) -> Rect<T> {
    let mut r = *r1;
    if r.x2 < r2.x2 {
        r.x2 = r2.x2;
    }
    if r.y2 < r2.y2 {
        r.y2 = r2.y2;
    }
    if r.x1 > r2.x1 {
        r.x1 = r2.x1;
    }
    if r.y1 > r2.y1 {
        r.y1 = r2.y1;
    }
    r
}

/// Rectangle with `i32` coordinates (device space, pixels).
pub type RectI = Rect<i32>;
/// Rectangle with `f64` coordinates (user space).
pub type RectD = Rect<f64>;

impl RectD {
    /// Smallest integer rectangle enclosing this one.
    pub fn to_enclosing_rect_i(&self) -> RectI {
        RectI::new(
            ifloor(self.x1),
            ifloor(self.y1),
            iceil(self.x2),
            iceil(self.y2),
        )
    }
}

impl RectI {
    /// Number of pixels covered; zero for empty rectangles.
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width() as usize * self.height() as usize
        }
    }

    /// The same rectangle shifted by (dx, dy).
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }
}

// ============================================================================
// Tests
// ============================================================================
