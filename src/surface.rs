//! Drawing destinations.
//!
//! A [`Surface`] is where finished rasters end up: it has a blend mode, a
//! color space and a user-to-device transform. [`PixelSurface`] keeps its
//! pixels in memory as premultiplied RGBA.

use crate::basics::{intersect_rectangles, RectI};
use crate::comp_op::{comp_op_blend, CompOp};
use crate::error::Result;
use crate::filter::{Filter, RenderContext};
use crate::gamma::{linear_to_srgb, srgb_to_linear};
use crate::pixel_layout::{ColorLayout, ColorSpace};
use crate::raster::Raster;
use crate::rendering_buffer::PixelBuffer;
use crate::trans_affine::TransAffine;

/// A destination for rasters.
pub trait Surface {
    /// Blend mode applied to everything drawn.
    fn comp_op(&self) -> CompOp;

    /// Color space of the destination pixels, if known.
    fn color_space(&self) -> Option<ColorSpace>;

    /// User space to device space.
    fn transform(&self) -> TransAffine;

    /// Blend `raster` onto the surface with [`comp_op`](Surface::comp_op).
    fn draw_raster(&mut self, raster: &dyn Raster);
}

/// Render `filter` with the surface's transform and draw the result.
pub fn draw_filter(surface: &mut dyn Surface, filter: &dyn Filter) -> Result<()> {
    let ctx = RenderContext::new(surface.transform());
    if let Some(raster) = filter.render(&ctx)? {
        surface.draw_raster(raster.as_ref());
    }
    Ok(())
}

// ============================================================================
// PixelSurface
// ============================================================================

/// An in-memory premultiplied RGBA surface.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    buffer: PixelBuffer,
    layout: ColorLayout,
    comp_op: CompOp,
    transform: TransAffine,
}

impl PixelSurface {
    /// A transparent surface covering `bounds`. `space` should be an RGB
    /// space.
    pub fn new(bounds: RectI, space: ColorSpace) -> Self {
        let layout = ColorLayout::premultiplied(space);
        Self {
            buffer: PixelBuffer::new(bounds, layout.bands()),
            layout,
            comp_op: CompOp::default(),
            transform: TransAffine::new(),
        }
    }

    pub fn set_comp_op(&mut self, op: CompOp) {
        self.comp_op = op;
    }

    pub fn set_transform(&mut self, transform: TransAffine) {
        self.transform = transform;
    }

    pub fn layout(&self) -> ColorLayout {
        self.layout
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

impl Surface for PixelSurface {
    fn comp_op(&self) -> CompOp {
        self.comp_op
    }

    fn color_space(&self) -> Option<ColorSpace> {
        Some(self.layout.space())
    }

    fn transform(&self) -> TransAffine {
        self.transform
    }

    fn draw_raster(&mut self, raster: &dyn Raster) {
        let r = intersect_rectangles(&raster.bounds(), &self.buffer.bounds());
        if r.is_empty() {
            return;
        }
        let src = raster.get_data(r);
        let src_layout = raster.color_layout();
        let sb = src_layout.bands();
        let db = self.layout.bands();

        let src_linear = matches!(src_layout.space(), ColorSpace::LinearRgb | ColorSpace::Gray);
        let dst_linear = self.layout.space() == ColorSpace::LinearRgb;
        let transfer = |v: f64| match (src_linear, dst_linear) {
            (false, true) => srgb_to_linear(v),
            (true, false) => linear_to_srgb(v),
            _ => v,
        };

        for y in r.y1..r.y2 {
            let s_row = src.row_span(y, r.x1, r.x2);
            let d_row = self.buffer.row_span_mut(y, r.x1, r.x2);
            for (sp, dp) in s_row.chunks_exact(sb).zip(d_row.chunks_exact_mut(db)) {
                let mut s = src_layout.read_straight(sp);
                s.r = transfer(s.r);
                s.g = transfer(s.g);
                s.b = transfer(s.b);
                s.premultiply();
                let d = self.layout.read_premultiplied(dp);
                let out = comp_op_blend(self.comp_op, &s, &d);
                self.layout.write_premultiplied(dp, &out);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::RectD;
    use crate::color::{Rgba, Rgba8};
    use crate::filter::FloodFilter;
    use crate::raster::BufferRaster;

    #[test]
    fn test_new_surface_is_transparent() {
        let s = PixelSurface::new(RectI::new(0, 0, 3, 3), ColorSpace::Srgb);
        assert_eq!(s.comp_op(), CompOp::SrcOver);
        assert_eq!(s.color_space(), Some(ColorSpace::Srgb));
        assert!(s.buffer().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_draw_raster_src_over() {
        let mut s = PixelSurface::new(RectI::new(0, 0, 2, 1), ColorSpace::LinearRgb);
        let red = BufferRaster::filled(
            RectI::new(0, 0, 2, 1),
            ColorLayout::straight(ColorSpace::LinearRgb),
            &[255, 0, 0, 255],
        );
        let blue = BufferRaster::filled(
            RectI::new(1, 0, 5, 1),
            ColorLayout::straight(ColorSpace::LinearRgb),
            &[0, 0, 255, 255],
        );
        s.draw_raster(&red);
        s.draw_raster(&blue);
        assert_eq!(s.buffer().pixel(0, 0), &[255, 0, 0, 255]);
        assert_eq!(s.buffer().pixel(1, 0), &[0, 0, 255, 255]);
    }

    #[test]
    fn test_draw_raster_comp_op() {
        let mut s = PixelSurface::new(RectI::new(0, 0, 1, 1), ColorSpace::Srgb);
        let red = BufferRaster::filled(
            RectI::new(0, 0, 1, 1),
            ColorLayout::opaque(ColorSpace::Srgb),
            &[255, 0, 0],
        );
        s.draw_raster(&red);
        s.set_comp_op(CompOp::Xor);
        s.draw_raster(&red);
        assert_eq!(s.buffer().pixel(0, 0), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_raster_converts_space() {
        let mut s = PixelSurface::new(RectI::new(0, 0, 1, 1), ColorSpace::LinearRgb);
        let gray = BufferRaster::filled(
            RectI::new(0, 0, 1, 1),
            ColorLayout::opaque(ColorSpace::Srgb),
            &[128, 128, 128],
        );
        s.draw_raster(&gray);
        let v = Rgba8::from_double(srgb_to_linear(128.0 / 255.0));
        assert_eq!(s.buffer().pixel(0, 0), &[v, v, v, 255]);
    }

    #[test]
    fn test_draw_filter_uses_transform() {
        let mut s = PixelSurface::new(RectI::new(0, 0, 4, 4), ColorSpace::Srgb);
        s.set_transform(TransAffine::new_translation(2.0, 2.0));
        let f = FloodFilter::new(RectD::new(0.0, 0.0, 1.0, 1.0), Rgba::new(0.0, 1.0, 0.0, 1.0));
        draw_filter(&mut s, &f).unwrap();
        assert_eq!(s.buffer().pixel(2, 2), &[0, 255, 0, 255]);
        assert_eq!(s.buffer().pixel(1, 1), &[0, 0, 0, 0]);
        assert_eq!(s.buffer().pixel(3, 3), &[0, 0, 0, 0]);
    }
}
