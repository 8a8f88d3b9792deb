//! Color types and operations.
//!
//! - `Rgba`: f64 components, the working space for all blending math
//! - `Rgba8`: u8 components, the storage format of every pixel buffer
//!
//! Neither type knows whether it holds premultiplied data; that is tracked
//! by the owning [`ColorLayout`](crate::pixel_layout::ColorLayout).

use crate::basics::uround;

// ============================================================================
// Rgba (f64)
// ============================================================================

/// RGBA color with f64 components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn premultiply(&mut self) -> &mut Self {
        self.r *= self.a;
        self.g *= self.a;
        self.b *= self.a;
        self
    }

    pub fn demultiply(&mut self) -> &mut Self {
        if self.a == 0.0 {
            self.r = 0.0;
            self.g = 0.0;
            self.b = 0.0;
        } else {
            let a = 1.0 / self.a;
            self.r *= a;
            self.g *= a;
            self.b *= a;
        }
        self
    }

    /// Clamp all components to [0, 1].
    pub fn clip(&mut self) -> &mut Self {
        self.r = self.r.clamp(0.0, 1.0);
        self.g = self.g.clamp(0.0, 1.0);
        self.b = self.b.clamp(0.0, 1.0);
        self.a = self.a.clamp(0.0, 1.0);
        self
    }

    /// Clamp color components so none exceeds alpha (valid premultiplied data).
    pub fn clip_to_alpha(&mut self) -> &mut Self {
        self.r = self.r.min(self.a);
        self.g = self.g.min(self.a);
        self.b = self.b.min(self.a);
        self
    }

    /// Luminance (ITU-R BT.709) of the color components.
    pub fn luminance(&self) -> f64 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }
}

// ============================================================================
// Rgba8 (8-bit per channel)
// ============================================================================

/// RGBA color with u8 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BASE_SHIFT: u32 = 8;
    pub const BASE_SCALE: u32 = 1 << Self::BASE_SHIFT;
    pub const BASE_MASK: u32 = Self::BASE_SCALE - 1;
    pub const BASE_MSB: u32 = 1 << (Self::BASE_SHIFT - 1);

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Convert from `Rgba` (f64) to `Rgba8` (u8), clamping out-of-range values.
    pub fn from_rgba(c: &Rgba) -> Self {
        Self {
            r: Self::from_double(c.r),
            g: Self::from_double(c.g),
            b: Self::from_double(c.b),
            a: Self::from_double(c.a),
        }
    }

    /// Convert to `Rgba` (f64).
    pub fn to_rgba(&self) -> Rgba {
        Rgba {
            r: Self::to_double(self.r),
            g: Self::to_double(self.g),
            b: Self::to_double(self.b),
            a: Self::to_double(self.a),
        }
    }

    #[inline]
    pub fn to_double(a: u8) -> f64 {
        a as f64 / Self::BASE_MASK as f64
    }

    #[inline]
    pub fn from_double(a: f64) -> u8 {
        uround(a.clamp(0.0, 1.0) * Self::BASE_MASK as f64) as u8
    }

    /// Fixed-point multiply, exact over u8.
    /// `(a * b + 128) >> 8`, with rounding correction.
    #[inline]
    pub fn multiply(a: u8, b: u8) -> u8 {
        let t: u32 = a as u32 * b as u32 + Self::BASE_MSB;
        (((t >> Self::BASE_SHIFT) + t) >> Self::BASE_SHIFT) as u8
    }

    /// Fixed-point demultiply of component `a` by alpha `b`, saturating.
    #[inline]
    pub fn demultiply_value(a: u8, b: u8) -> u8 {
        if b == 0 {
            0
        } else if a >= b {
            Self::BASE_MASK as u8
        } else {
            ((a as u32 * Self::BASE_MASK + (b as u32 >> 1)) / b as u32) as u8
        }
    }

    pub fn premultiply(&mut self) -> &mut Self {
        if self.a != Self::BASE_MASK as u8 {
            if self.a == 0 {
                self.r = 0;
                self.g = 0;
                self.b = 0;
            } else {
                self.r = Self::multiply(self.r, self.a);
                self.g = Self::multiply(self.g, self.a);
                self.b = Self::multiply(self.b, self.a);
            }
        }
        self
    }

    pub fn demultiply(&mut self) -> &mut Self {
        if (self.a as u32) < Self::BASE_MASK {
            if self.a == 0 {
                self.r = 0;
                self.g = 0;
                self.b = 0;
            } else {
                self.r = Self::demultiply_value(self.r, self.a);
                self.g = Self::demultiply_value(self.g, self.a);
                self.b = Self::demultiply_value(self.b, self.a);
            }
        }
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
