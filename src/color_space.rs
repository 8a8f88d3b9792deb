//! Working color spaces and raster color conversion.
//!
//! Compositing happens in one of two working spaces, linear RGB or sRGB.
//! Sources in any other space are converted on the fly, through the 8-bit
//! lookup tables in [`gamma`](crate::gamma), into straight RGBA.

use std::sync::Arc;

use crate::basics::{intersect_rectangles, RectI};
use crate::color::Rgba8;
use crate::error::CompositeError;
use crate::gamma::SrgbLut;
use crate::pixel_layout::{ColorLayout, ColorSpace, SampleLayout};
use crate::raster::Raster;
use crate::rendering_buffer::PixelBuffer;

// ============================================================================
// ColorWorkingSpace
// ============================================================================

/// Color space in which a composition is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorWorkingSpace {
    LinearRgb,
    StandardRgb,
}

impl Default for ColorWorkingSpace {
    fn default() -> Self {
        ColorWorkingSpace::LinearRgb
    }
}

impl ColorWorkingSpace {
    pub fn color_space(&self) -> ColorSpace {
        match self {
            ColorWorkingSpace::LinearRgb => ColorSpace::LinearRgb,
            ColorWorkingSpace::StandardRgb => ColorSpace::Srgb,
        }
    }

    /// Convert `raster` into this space (no-op when it already is).
    pub fn convert(&self, raster: Arc<dyn Raster>) -> Arc<dyn Raster> {
        match self {
            ColorWorkingSpace::LinearRgb => convert_to_linear(raster),
            ColorWorkingSpace::StandardRgb => convert_to_srgb(raster),
        }
    }
}

impl TryFrom<ColorSpace> for ColorWorkingSpace {
    type Error = CompositeError;

    fn try_from(space: ColorSpace) -> Result<Self, Self::Error> {
        match space {
            ColorSpace::LinearRgb => Ok(ColorWorkingSpace::LinearRgb),
            ColorSpace::Srgb => Ok(ColorWorkingSpace::StandardRgb),
            other => Err(CompositeError::UnsupportedColorSpace(other)),
        }
    }
}

impl From<ColorWorkingSpace> for ColorSpace {
    fn from(ws: ColorWorkingSpace) -> Self {
        ws.color_space()
    }
}

/// Linear-light spaces; everything else is treated as sRGB-encoded.
fn is_linear(space: ColorSpace) -> bool {
    matches!(space, ColorSpace::LinearRgb | ColorSpace::Gray)
}

// ============================================================================
// ColorConvertRaster
// ============================================================================

/// Presents another raster as straight RGBA in a target space.
pub struct ColorConvertRaster {
    source: Arc<dyn Raster>,
    layout: ColorLayout,
}

impl ColorConvertRaster {
    /// `target` must be [`ColorSpace::Srgb`] or [`ColorSpace::LinearRgb`].
    pub fn new(source: Arc<dyn Raster>, target: ColorSpace) -> Self {
        debug_assert!(matches!(target, ColorSpace::Srgb | ColorSpace::LinearRgb));
        Self {
            source,
            layout: ColorLayout::straight(target),
        }
    }

    pub fn source(&self) -> &Arc<dyn Raster> {
        &self.source
    }
}

impl Raster for ColorConvertRaster {
    fn bounds(&self) -> RectI {
        self.source.bounds()
    }

    fn color_layout(&self) -> ColorLayout {
        self.layout
    }

    fn sample_layout(&self) -> SampleLayout {
        let sl = self.source.sample_layout();
        SampleLayout::new(sl.width, sl.height, self.layout.bands())
    }

    fn copy_data(&self, dst: &mut PixelBuffer) {
        let r = intersect_rectangles(&self.source.bounds(), &dst.bounds());
        if r.is_empty() {
            return;
        }
        let src = self.source.get_data(r);
        let src_layout = self.source.color_layout();
        let sb = src_layout.bands();
        let db = self.layout.bands();

        let lut = SrgbLut::get();
        let from_linear = is_linear(src_layout.space());
        let to_linear = is_linear(self.layout.space());
        let map = |v: u8| match (from_linear, to_linear) {
            (false, true) => lut.to_linear(v),
            (true, false) => lut.to_srgb(v),
            _ => v,
        };

        for y in r.y1..r.y2 {
            let s_row = src.row_span(y, r.x1, r.x2);
            let d_row = dst.row_span_mut(y, r.x1, r.x2);
            for (sp, dp) in s_row.chunks_exact(sb).zip(d_row.chunks_exact_mut(db)) {
                let c = src_layout.read_straight(sp);
                dp[0] = map(Rgba8::from_double(c.r));
                dp[1] = map(Rgba8::from_double(c.g));
                dp[2] = map(Rgba8::from_double(c.b));
                dp[3] = Rgba8::from_double(c.a);
            }
        }
    }
}

/// `raster` in linear RGB. Returned unchanged if already linear RGB.
pub fn convert_to_linear(raster: Arc<dyn Raster>) -> Arc<dyn Raster> {
    convert_to(raster, ColorSpace::LinearRgb)
}

/// `raster` in sRGB. Returned unchanged if already sRGB.
pub fn convert_to_srgb(raster: Arc<dyn Raster>) -> Arc<dyn Raster> {
    convert_to(raster, ColorSpace::Srgb)
}

fn convert_to(raster: Arc<dyn Raster>, target: ColorSpace) -> Arc<dyn Raster> {
    if raster.color_layout().space() == target {
        return raster;
    }
    log::trace!(
        "converting {:?} raster to {:?}",
        raster.color_layout().space(),
        target
    );
    Arc::new(ColorConvertRaster::new(raster, target))
}

// ============================================================================
// Alpha coercion
// ============================================================================

/// Bring the samples of `buf` to the requested alpha state and return the
/// resulting layout. Layouts without alpha are returned unchanged.
pub fn coerce_alpha_premultiplied(
    buf: &mut PixelBuffer,
    layout: ColorLayout,
    premultiplied: bool,
) -> ColorLayout {
    if !layout.has_alpha() || layout.is_alpha_premultiplied() == premultiplied {
        return layout;
    }
    let n = layout.color_bands();
    let bands = layout.bands();
    debug_assert_eq!(buf.bands(), bands);
    for px in buf.data_mut().chunks_exact_mut(bands) {
        let a = px[n];
        for s in px[..n].iter_mut() {
            *s = if premultiplied {
                Rgba8::multiply(*s, a)
            } else {
                Rgba8::demultiply_value(*s, a)
            };
        }
    }
    layout.with_alpha_premultiplied(premultiplied)
}

// ============================================================================
// Tests
// ============================================================================
