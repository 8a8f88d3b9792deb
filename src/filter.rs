//! Resolution-independent image sources.
//!
//! A [`Filter`] lives in user space and produces a device-space
//! [`Raster`] when rendered under a [`RenderContext`]. Filters are shared
//! through `Arc<dyn Filter>` and may be rendered from several threads.

use std::sync::Arc;

use crate::basics::{intersect_rectangles, unite_rectangles, RectD, RectI};
use crate::color::Rgba;
use crate::error::Result;
use crate::pad_raster::{PadMode, PadRaster};
use crate::pixel_layout::{ColorLayout, ColorSpace, SampleLayout};
use crate::raster::{FloodRaster, Raster};
use crate::rendering_buffer::PixelBuffer;
use crate::trans_affine::TransAffine;

// ============================================================================
// Render configuration
// ============================================================================

/// Speed/quality trade-off requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderQuality {
    Speed,
    #[default]
    Default,
    Quality,
}

/// Resampling used by sources that scale images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    NearestNeighbor,
    #[default]
    Bilinear,
}

/// Rendering options, passed through to every source unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderHints {
    pub quality: RenderQuality,
    pub interpolation: Interpolation,
}

/// Everything a filter needs to produce pixels: where user space lands on
/// the device, which part of it is wanted, and the caller's hints.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderContext {
    transform: TransAffine,
    area_of_interest: Option<RectD>,
    hints: RenderHints,
}

impl RenderContext {
    pub fn new(transform: TransAffine) -> Self {
        Self {
            transform,
            area_of_interest: None,
            hints: RenderHints::default(),
        }
    }

    pub fn with_area_of_interest(mut self, aoi: RectD) -> Self {
        self.area_of_interest = Some(aoi);
        self
    }

    pub fn with_hints(mut self, hints: RenderHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn transform(&self) -> &TransAffine {
        &self.transform
    }

    /// Wanted region in user space; `None` means everything.
    pub fn area_of_interest(&self) -> Option<RectD> {
        self.area_of_interest
    }

    pub fn hints(&self) -> RenderHints {
        self.hints
    }

    /// Device rectangle covering `r`.
    pub fn device_rect(&self, r: &RectD) -> RectI {
        self.transform.transform_rect_to_device(r)
    }
}

// ============================================================================
// Filter traits
// ============================================================================

/// A resolution-independent image.
pub trait Filter: Send + Sync {
    /// User-space bounds.
    fn bounds(&self) -> RectD;

    /// Render into device space. `Ok(None)` means nothing is visible.
    fn render(&self, ctx: &RenderContext) -> Result<Option<Arc<dyn Raster>>>;
}

/// A filter built from other filters.
pub trait FilterSources {
    fn sources(&self) -> &[Arc<dyn Filter>];

    fn set_sources(&mut self, sources: Vec<Arc<dyn Filter>>);

    fn source_count(&self) -> usize {
        self.sources().len()
    }

    /// Union of the sources' bounds, `None` without sources.
    fn sources_bounds(&self) -> Option<RectD> {
        let mut it = self.sources().iter().map(|s| s.bounds());
        let first = it.next()?;
        Some(it.fold(first, |acc, r| unite_rectangles(&acc, &r)))
    }
}

/// Narrow `bounds` to the context's area of interest; `None` if nothing of
/// it is wanted.
fn visible_part(bounds: &RectD, ctx: &RenderContext) -> Option<RectD> {
    match ctx.area_of_interest() {
        None => Some(*bounds),
        Some(aoi) if bounds.intersects(&aoi) => Some(intersect_rectangles(bounds, &aoi)),
        Some(_) => None,
    }
}

// ============================================================================
// FloodFilter
// ============================================================================

/// A solid color over a user-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodFilter {
    rect: RectD,
    color: Rgba,
}

impl FloodFilter {
    /// `color` is straight (non-premultiplied) sRGB.
    pub fn new(rect: RectD, color: Rgba) -> Self {
        Self { rect, color }
    }

    pub fn color(&self) -> Rgba {
        self.color
    }
}

impl Filter for FloodFilter {
    fn bounds(&self) -> RectD {
        self.rect
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<Arc<dyn Raster>>> {
        let area = match visible_part(&self.rect, ctx) {
            Some(a) => a,
            None => return Ok(None),
        };
        let dev = ctx.device_rect(&area);
        if dev.is_empty() {
            return Ok(None);
        }
        let mut c = self.color;
        c.premultiply();
        Ok(Some(Arc::new(FloodRaster::new(
            dev,
            &c,
            ColorLayout::premultiplied(ColorSpace::Srgb),
        ))))
    }
}

// ============================================================================
// RasterFilter
// ============================================================================

/// A device-space raster used as a filter.
///
/// The raster's pixel grid is its user space, so it can only be rendered
/// under transforms that move it by whole pixels.
#[derive(Clone)]
pub struct RasterFilter {
    raster: Arc<dyn Raster>,
}

impl RasterFilter {
    pub fn new(raster: Arc<dyn Raster>) -> Self {
        Self { raster }
    }

    pub fn raster(&self) -> &Arc<dyn Raster> {
        &self.raster
    }
}

impl Filter for RasterFilter {
    fn bounds(&self) -> RectD {
        let b = self.raster.bounds();
        RectD::new(b.x1 as f64, b.y1 as f64, b.x2 as f64, b.y2 as f64)
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<Arc<dyn Raster>>> {
        let (dx, dy) = match ctx.transform().integer_translation() {
            Some(t) => t,
            None => {
                log::warn!(
                    "raster filter cannot render under {:?}, skipping",
                    ctx.transform()
                );
                return Ok(None);
            }
        };
        let area = match visible_part(&self.bounds(), ctx) {
            Some(a) => a,
            None => return Ok(None),
        };

        let moved: Arc<dyn Raster> = if dx == 0 && dy == 0 {
            self.raster.clone()
        } else {
            Arc::new(TranslatedRaster {
                source: self.raster.clone(),
                dx,
                dy,
            })
        };

        let wanted = intersect_rectangles(&ctx.device_rect(&area), &moved.bounds());
        if wanted.is_empty() {
            return Ok(None);
        }
        if wanted == moved.bounds() {
            Ok(Some(moved))
        } else {
            Ok(Some(Arc::new(PadRaster::new(moved, wanted, PadMode::Zero))))
        }
    }
}

/// A raster moved by whole pixels.
struct TranslatedRaster {
    source: Arc<dyn Raster>,
    dx: i32,
    dy: i32,
}

impl Raster for TranslatedRaster {
    fn bounds(&self) -> RectI {
        self.source.bounds().translated(self.dx, self.dy)
    }

    fn color_layout(&self) -> ColorLayout {
        self.source.color_layout()
    }

    fn sample_layout(&self) -> SampleLayout {
        self.source.sample_layout()
    }

    fn copy_data(&self, dst: &mut PixelBuffer) {
        dst.translate(-self.dx, -self.dy);
        self.source.copy_data(dst);
        dst.translate(self.dx, self.dy);
    }

    fn is_cached(&self) -> bool {
        self.source.is_cached()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::BufferRaster;

    fn gray_raster() -> Arc<dyn Raster> {
        let buf = PixelBuffer::from_vec(RectI::new(0, 0, 2, 2), 1, vec![1, 2, 3, 4]).unwrap();
        Arc::new(BufferRaster::new(buf, ColorLayout::opaque(ColorSpace::Gray)))
    }

    #[test]
    fn test_render_context_defaults() {
        let ctx = RenderContext::default();
        assert!(ctx.transform().is_identity(1e-14));
        assert_eq!(ctx.area_of_interest(), None);
        assert_eq!(ctx.hints().quality, RenderQuality::Default);
        assert_eq!(ctx.hints().interpolation, Interpolation::Bilinear);
    }

    #[test]
    fn test_flood_filter_renders_device_rect() {
        let f = FloodFilter::new(RectD::new(0.0, 0.0, 2.0, 1.0), Rgba::new(1.0, 0.0, 0.0, 0.5));
        let ctx = RenderContext::new(TransAffine::new_scaling(2.0, 2.0));
        let r = f.render(&ctx).unwrap().unwrap();
        assert_eq!(r.bounds(), RectI::new(0, 0, 4, 2));
        assert_eq!(r.get_data(r.bounds()).pixel(3, 1), &[128, 0, 0, 128]);
    }

    #[test]
    fn test_flood_filter_outside_aoi() {
        let f = FloodFilter::new(RectD::new(0.0, 0.0, 2.0, 2.0), Rgba::new(1.0, 1.0, 1.0, 1.0));
        let ctx = RenderContext::default().with_area_of_interest(RectD::new(5.0, 5.0, 6.0, 6.0));
        assert!(f.render(&ctx).unwrap().is_none());

        let ctx = RenderContext::default().with_area_of_interest(RectD::new(1.0, 0.0, 6.0, 6.0));
        let r = f.render(&ctx).unwrap().unwrap();
        assert_eq!(r.bounds(), RectI::new(1, 0, 2, 2));
    }

    #[test]
    fn test_raster_filter_identity() {
        let raster = gray_raster();
        let f = RasterFilter::new(raster.clone());
        assert_eq!(f.bounds(), RectD::new(0.0, 0.0, 2.0, 2.0));
        let r = f.render(&RenderContext::default()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&r, &raster));
    }

    #[test]
    fn test_raster_filter_translation() {
        let f = RasterFilter::new(gray_raster());
        let ctx = RenderContext::new(TransAffine::new_translation(10.0, -5.0));
        let r = f.render(&ctx).unwrap().unwrap();
        assert_eq!(r.bounds(), RectI::new(10, -5, 12, -3));
        let out = r.get_data(r.bounds());
        assert_eq!(out.pixel(10, -5), &[1]);
        assert_eq!(out.pixel(11, -4), &[4]);
    }

    #[test]
    fn test_raster_filter_crops_to_aoi() {
        let f = RasterFilter::new(gray_raster());
        let ctx = RenderContext::default().with_area_of_interest(RectD::new(1.0, 0.0, 2.0, 2.0));
        let r = f.render(&ctx).unwrap().unwrap();
        assert_eq!(r.bounds(), RectI::new(1, 0, 2, 2));
        assert_eq!(r.get_data(RectI::new(0, 1, 2, 2)).row_span(1, 0, 2), &[0, 4]);
    }

    #[test]
    fn test_raster_filter_rejects_scaling() {
        let f = RasterFilter::new(gray_raster());
        let ctx = RenderContext::new(TransAffine::new_scaling(2.0, 2.0));
        assert!(f.render(&ctx).unwrap().is_none());
    }

    struct Group(Vec<Arc<dyn Filter>>);

    impl FilterSources for Group {
        fn sources(&self) -> &[Arc<dyn Filter>] {
            &self.0
        }
        fn set_sources(&mut self, sources: Vec<Arc<dyn Filter>>) {
            self.0 = sources;
        }
    }

    #[test]
    fn test_filter_sources_bounds() {
        let mut g = Group(Vec::new());
        assert_eq!(g.sources_bounds(), None);
        g.set_sources(vec![
            Arc::new(FloodFilter::new(RectD::new(0.0, 0.0, 1.0, 1.0), Rgba::transparent())),
            Arc::new(FloodFilter::new(RectD::new(-1.0, 2.0, 0.5, 3.0), Rgba::transparent())),
        ]);
        assert_eq!(g.source_count(), 2);
        assert_eq!(g.sources_bounds(), Some(RectD::new(-1.0, 0.0, 1.0, 3.0)));
    }
}
