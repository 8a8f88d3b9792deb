//! Channel and sample layouts.
//!
//! [`ColorLayout`] says what the bands of a pixel mean (color space, alpha,
//! premultiplication); [`SampleLayout`] says how many pixels and bands a
//! tile of storage holds. Together they play the role of a color model and
//! a sample model for [`Raster`](crate::raster::Raster) implementations.
//!
//! The per-pixel readers and writers here convert between any layout and
//! the f64 RGBA working space used by the blenders.

use crate::color::{Rgba, Rgba8};

// ============================================================================
// ColorSpace
// ============================================================================

/// Color space of pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpace {
    /// Gamma-encoded sRGB.
    Srgb,
    /// Linear-light RGB with sRGB primaries.
    LinearRgb,
    /// Single-band linear luminance.
    Gray,
    /// Four-band device CMYK.
    Cmyk,
}

impl ColorSpace {
    /// Number of color (non-alpha) bands.
    pub fn color_bands(&self) -> usize {
        match self {
            ColorSpace::Srgb | ColorSpace::LinearRgb => 3,
            ColorSpace::Gray => 1,
            ColorSpace::Cmyk => 4,
        }
    }
}

// ============================================================================
// ColorLayout
// ============================================================================

/// Interpretation of the bands of a pixel: color bands first, then an
/// optional alpha band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorLayout {
    space: ColorSpace,
    has_alpha: bool,
    premultiplied: bool,
}

impl ColorLayout {
    /// `premultiplied` is ignored when there is no alpha band.
    pub fn new(space: ColorSpace, has_alpha: bool, premultiplied: bool) -> Self {
        Self {
            space,
            has_alpha,
            premultiplied: has_alpha && premultiplied,
        }
    }

    /// Color bands followed by a straight (non-premultiplied) alpha band.
    pub fn straight(space: ColorSpace) -> Self {
        Self::new(space, true, false)
    }

    /// Color bands followed by a premultiplied alpha band.
    pub fn premultiplied(space: ColorSpace) -> Self {
        Self::new(space, true, true)
    }

    /// Color bands only; every pixel is opaque.
    pub fn opaque(space: ColorSpace) -> Self {
        Self::new(space, false, false)
    }

    pub fn space(&self) -> ColorSpace {
        self.space
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn is_alpha_premultiplied(&self) -> bool {
        self.premultiplied
    }

    /// Total bands per pixel, alpha included.
    pub fn bands(&self) -> usize {
        self.space.color_bands() + self.has_alpha as usize
    }

    pub fn color_bands(&self) -> usize {
        self.space.color_bands()
    }

    /// The same layout with the given alpha state (no-op without alpha).
    pub fn with_alpha_premultiplied(&self, premultiplied: bool) -> Self {
        Self::new(self.space, self.has_alpha, premultiplied)
    }

    /// The same layout in another color space.
    pub fn with_space(&self, space: ColorSpace) -> Self {
        Self::new(space, self.has_alpha, self.premultiplied)
    }

    #[inline]
    fn alpha(&self, px: &[u8]) -> f64 {
        if self.has_alpha {
            Rgba8::to_double(px[self.color_bands()])
        } else {
            1.0
        }
    }

    /// Read a pixel as premultiplied RGBA.
    pub fn read_premultiplied(&self, px: &[u8]) -> Rgba {
        let a = self.alpha(px);
        match self.space {
            ColorSpace::Cmyk => {
                let mut c = self.read_straight(px);
                c.premultiply();
                c
            }
            ColorSpace::Gray => {
                let v = Rgba8::to_double(px[0]);
                let v = if self.premultiplied { v } else { v * a };
                Rgba::new(v, v, v, a)
            }
            ColorSpace::Srgb | ColorSpace::LinearRgb => {
                let mut c = Rgba::new(
                    Rgba8::to_double(px[0]),
                    Rgba8::to_double(px[1]),
                    Rgba8::to_double(px[2]),
                    a,
                );
                if !self.premultiplied {
                    c.premultiply();
                }
                c
            }
        }
    }

    /// Read a pixel as straight (non-premultiplied) RGBA.
    pub fn read_straight(&self, px: &[u8]) -> Rgba {
        let a = self.alpha(px);
        let mut bands = [0.0f64; 4];
        for (i, b) in bands.iter_mut().enumerate().take(self.color_bands()) {
            *b = Rgba8::to_double(px[i]);
        }
        if self.premultiplied {
            let inv = if a > 0.0 { 1.0 / a } else { 0.0 };
            for b in bands.iter_mut() {
                *b = (*b * inv).min(1.0);
            }
        }
        match self.space {
            ColorSpace::Gray => Rgba::new(bands[0], bands[0], bands[0], a),
            ColorSpace::Cmyk => {
                let k = 1.0 - bands[3];
                Rgba::new(
                    (1.0 - bands[0]) * k,
                    (1.0 - bands[1]) * k,
                    (1.0 - bands[2]) * k,
                    a,
                )
            }
            ColorSpace::Srgb | ColorSpace::LinearRgb => Rgba::new(bands[0], bands[1], bands[2], a),
        }
    }

    /// Write a premultiplied RGBA color into a pixel of this layout.
    ///
    /// Without an alpha band the color is stored straight and the alpha is
    /// dropped.
    pub fn write_premultiplied(&self, px: &mut [u8], c: &Rgba) {
        match self.space {
            ColorSpace::Srgb | ColorSpace::LinearRgb | ColorSpace::Gray
                if self.premultiplied =>
            {
                self.store_color(px, c);
            }
            _ => {
                let mut s = *c;
                s.demultiply();
                self.write_straight(px, &s);
            }
        }
    }

    /// Write a straight RGBA color into a pixel of this layout.
    pub fn write_straight(&self, px: &mut [u8], c: &Rgba) {
        self.store_color(px, c);
        if self.premultiplied {
            let n = self.color_bands();
            let a = px[n];
            for s in px[..n].iter_mut() {
                *s = Rgba8::multiply(*s, a);
            }
        }
    }

    /// Store color bands and alpha without any alpha arithmetic.
    fn store_color(&self, px: &mut [u8], c: &Rgba) {
        match self.space {
            ColorSpace::Gray => px[0] = Rgba8::from_double(c.luminance()),
            ColorSpace::Cmyk => {
                let k = 1.0 - c.r.max(c.g).max(c.b);
                let d = 1.0 - k;
                let (cy, m, y) = if d > 0.0 {
                    ((d - c.r) / d, (d - c.g) / d, (d - c.b) / d)
                } else {
                    (0.0, 0.0, 0.0)
                };
                px[0] = Rgba8::from_double(cy);
                px[1] = Rgba8::from_double(m);
                px[2] = Rgba8::from_double(y);
                px[3] = Rgba8::from_double(k);
            }
            ColorSpace::Srgb | ColorSpace::LinearRgb => {
                px[0] = Rgba8::from_double(c.r);
                px[1] = Rgba8::from_double(c.g);
                px[2] = Rgba8::from_double(c.b);
            }
        }
        if self.has_alpha {
            px[self.color_bands()] = Rgba8::from_double(c.a);
        }
    }
}

// ============================================================================
// SampleLayout
// ============================================================================

/// Shape of a block of pixel storage: width × height pixels of `bands`
/// samples each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleLayout {
    pub width: i32,
    pub height: i32,
    pub bands: usize,
}

impl SampleLayout {
    pub fn new(width: i32, height: i32, bands: usize) -> Self {
        Self {
            width,
            height,
            bands,
        }
    }

    /// A layout with the same bands and a different size.
    pub fn create_compatible(&self, width: i32, height: i32) -> Self {
        Self::new(width, height, self.bands)
    }
}

// ============================================================================
// Tests
// ============================================================================
