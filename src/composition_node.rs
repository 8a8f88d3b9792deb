//! Resolution-independent composition of filters.
//!
//! A [`CompositionNode`] holds an ordered list of source filters (bottom to
//! top), a [`CompositeRule`] and a working color space. Rendering it yields
//! a [`TiledCompositeRaster`]; painting it onto a compatible surface can
//! skip the raster entirely and draw the sources one after another.

use std::sync::{Arc, OnceLock};

use crate::basics::{intersect_rectangles, unite_rectangles, RectD};
use crate::color_space::ColorWorkingSpace;
use crate::comp_op::CompOp;
use crate::composite_raster::TiledCompositeRaster;
use crate::composite_rule::{BlankSourcePolicy, CompositeRule};
use crate::error::Result;
use crate::filter::{Filter, FilterSources, RenderContext};
use crate::pixel_layout::{ColorLayout, ColorSpace};
use crate::raster::{self, FloodRaster, Raster};
use crate::surface::{draw_filter, Surface};

/// Layers of filters composited under one rule.
pub struct CompositionNode {
    sources: Vec<Arc<dyn Filter>>,
    rule: CompositeRule,
    space: ColorWorkingSpace,
    bounds: OnceLock<RectD>,
    stamp: u64,
}

impl CompositionNode {
    pub fn new(
        sources: Vec<Arc<dyn Filter>>,
        rule: CompositeRule,
        space: ColorWorkingSpace,
    ) -> Self {
        Self {
            sources,
            rule,
            space,
            bounds: OnceLock::new(),
            stamp: 0,
        }
    }

    fn touch(&mut self) {
        self.stamp += 1;
        self.bounds = OnceLock::new();
    }

    /// Counter bumped by every mutation.
    pub fn modification_stamp(&self) -> u64 {
        self.stamp
    }

    pub fn sources(&self) -> &[Arc<dyn Filter>] {
        &self.sources
    }

    pub fn set_sources(&mut self, sources: Vec<Arc<dyn Filter>>) {
        self.touch();
        self.sources = sources;
    }

    pub fn rule(&self) -> CompositeRule {
        self.rule
    }

    pub fn set_rule(&mut self, rule: CompositeRule) {
        self.touch();
        self.rule = rule;
    }

    pub fn color_working_space(&self) -> ColorWorkingSpace {
        self.space
    }

    pub fn set_color_working_space(&mut self, space: ColorWorkingSpace) {
        self.touch();
        self.space = space;
    }

    pub fn color_space(&self) -> ColorSpace {
        self.space.color_space()
    }

    /// Composite in `space`, which must be sRGB or linear RGB. Any other
    /// space is rejected and leaves the node unchanged.
    pub fn set_color_space(&mut self, space: ColorSpace) -> Result<()> {
        let ws = ColorWorkingSpace::try_from(space)?;
        self.set_color_working_space(ws);
        Ok(())
    }

    /// Union of the source bounds; empty without sources.
    pub fn bounds(&self) -> RectD {
        *self.bounds.get_or_init(|| {
            let mut it = self.sources.iter().map(|s| s.bounds());
            match it.next() {
                Some(first) => it.fold(first, |acc, r| unite_rectangles(&acc, &r)),
                None => RectD::default(),
            }
        })
    }

    /// Draw the sources straight onto `surface`, in order, when that gives
    /// the same picture as compositing them first.
    ///
    /// Returns `false` without drawing anything when the surface does not
    /// blend with source-over, the rule is not OVER, or the surface's color
    /// space differs from the working space. Also returns `false` if a
    /// source fails to render; sources drawn before it stay drawn.
    pub fn try_direct_paint(&self, surface: &mut dyn Surface) -> bool {
        if surface.comp_op() != CompOp::SrcOver {
            return false;
        }
        if self.rule != CompositeRule::Over {
            return false;
        }
        if surface.color_space() != Some(self.color_space()) {
            return false;
        }
        for src in &self.sources {
            if let Err(e) = draw_filter(surface, src.as_ref()) {
                log::warn!("direct paint aborted: {}", e);
                return false;
            }
        }
        true
    }

    /// Render the composition for `ctx`.
    ///
    /// Returns `Ok(None)` when nothing would be visible: no sources, an
    /// area of interest that misses the node, every source blank, or a
    /// blank source under IN.
    pub fn create_rendering(
        &self,
        ctx: &RenderContext,
    ) -> Result<Option<Arc<TiledCompositeRaster>>> {
        if self.sources.is_empty() {
            return Ok(None);
        }

        let bounds = self.bounds();
        let aoi = match ctx.area_of_interest() {
            Some(aoi) => {
                if !bounds.intersects(&aoi) {
                    log::debug!("area of interest {:?} misses {:?}", aoi, bounds);
                    return Ok(None);
                }
                intersect_rectangles(&aoi, &bounds)
            }
            None => bounds,
        };
        let dev_rect = ctx.device_rect(&aoi);
        let src_ctx = RenderContext::new(*ctx.transform())
            .with_area_of_interest(aoi)
            .with_hints(ctx.hints());

        let mut rasters: Vec<Arc<dyn Raster>> = Vec::with_capacity(self.sources.len());
        for (i, filter) in self.sources.iter().enumerate() {
            if let Some(r) = filter.render(&src_ctx)? {
                rasters.push(self.space.convert(raster::wrap(r)));
                continue;
            }
            let policy = self.rule.blank_source_policy();
            log::trace!("source {} is blank, {:?}", i, policy);
            match policy {
                BlankSourcePolicy::Abort => return Ok(None),
                BlankSourcePolicy::ClearAccumulated => rasters.clear(),
                BlankSourcePolicy::Placeholder => {
                    let layout = ColorLayout::premultiplied(self.color_space());
                    rasters.push(Arc::new(FloodRaster::transparent(dev_rect, layout)));
                }
                BlankSourcePolicy::Skip => {}
            }
        }

        if rasters.is_empty() {
            log::debug!("composition is empty under {:?}", self.rule);
            return Ok(None);
        }

        let composite = TiledCompositeRaster::new(rasters, self.rule)?;
        log::debug!("composition rendered at {:?}", composite.bounds());
        Ok(Some(Arc::new(composite)))
    }
}

impl FilterSources for CompositionNode {
    fn sources(&self) -> &[Arc<dyn Filter>] {
        CompositionNode::sources(self)
    }

    fn set_sources(&mut self, sources: Vec<Arc<dyn Filter>>) {
        CompositionNode::set_sources(self, sources)
    }
}

impl Filter for CompositionNode {
    fn bounds(&self) -> RectD {
        CompositionNode::bounds(self)
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<Arc<dyn Raster>>> {
        Ok(self
            .create_rendering(ctx)?
            .map(|r| r as Arc<dyn Raster>))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::RectI;
    use crate::color::Rgba;
    use crate::error::CompositeError;
    use crate::filter::FloodFilter;

    fn flood(x1: f64, y1: f64, x2: f64, y2: f64, c: Rgba) -> Arc<dyn Filter> {
        Arc::new(FloodFilter::new(RectD::new(x1, y1, x2, y2), c))
    }

    fn node(rule: CompositeRule) -> CompositionNode {
        CompositionNode::new(
            vec![
                flood(0.0, 0.0, 4.0, 4.0, Rgba::new(1.0, 0.0, 0.0, 1.0)),
                flood(2.0, 2.0, 8.0, 6.0, Rgba::new(0.0, 0.0, 1.0, 1.0)),
            ],
            rule,
            ColorWorkingSpace::LinearRgb,
        )
    }

    #[test]
    fn test_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompositionNode>();
    }

    #[test]
    fn test_bounds_union_and_cache_invalidation() {
        let mut n = node(CompositeRule::In);
        assert_eq!(n.bounds(), RectD::new(0.0, 0.0, 8.0, 6.0));
        n.set_sources(vec![flood(1.0, 1.0, 2.0, 2.0, Rgba::transparent())]);
        assert_eq!(n.bounds(), RectD::new(1.0, 1.0, 2.0, 2.0));
        n.set_sources(Vec::new());
        assert_eq!(n.bounds(), RectD::default());
    }

    #[test]
    fn test_set_rule_replaces_rule() {
        let mut n = node(CompositeRule::Over);
        let stamp = n.modification_stamp();
        n.set_rule(CompositeRule::Xor);
        assert_eq!(n.rule(), CompositeRule::Xor);
        assert!(n.modification_stamp() > stamp);
    }

    #[test]
    fn test_set_color_space() {
        let mut n = node(CompositeRule::Over);
        n.set_color_space(ColorSpace::Srgb).unwrap();
        assert_eq!(n.color_working_space(), ColorWorkingSpace::StandardRgb);
        assert_eq!(n.color_space(), ColorSpace::Srgb);

        let stamp = n.modification_stamp();
        let err = n.set_color_space(ColorSpace::Gray).unwrap_err();
        assert_eq!(err, CompositeError::UnsupportedColorSpace(ColorSpace::Gray));
        assert!(err.is_invalid_argument());
        assert_eq!(n.color_space(), ColorSpace::Srgb);
        assert_eq!(n.modification_stamp(), stamp);
    }

    #[test]
    fn test_render_no_sources() {
        let n = CompositionNode::new(Vec::new(), CompositeRule::Over, ColorWorkingSpace::LinearRgb);
        assert!(n.create_rendering(&RenderContext::default()).unwrap().is_none());
    }

    #[test]
    fn test_render_aoi_misses() {
        let n = node(CompositeRule::Over);
        let ctx = RenderContext::default().with_area_of_interest(RectD::new(20.0, 20.0, 30.0, 30.0));
        assert!(n.create_rendering(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_render_bounds_per_rule() {
        let ctx = RenderContext::default();
        let over = node(CompositeRule::Over).create_rendering(&ctx).unwrap().unwrap();
        assert_eq!(over.bounds(), RectI::new(0, 0, 8, 6));
        let inn = node(CompositeRule::In).create_rendering(&ctx).unwrap().unwrap();
        assert_eq!(inn.bounds(), RectI::new(2, 2, 4, 4));
        let out = node(CompositeRule::Out).create_rendering(&ctx).unwrap().unwrap();
        assert_eq!(out.bounds(), RectI::new(2, 2, 8, 6));
    }

    #[test]
    fn test_render_working_space_layout() {
        let ctx = RenderContext::default();
        let mut n = node(CompositeRule::Over);
        let r = n.create_rendering(&ctx).unwrap().unwrap();
        assert_eq!(r.color_layout(), ColorLayout::premultiplied(ColorSpace::LinearRgb));
        n.set_color_working_space(ColorWorkingSpace::StandardRgb);
        let r = n.create_rendering(&ctx).unwrap().unwrap();
        assert_eq!(r.color_layout(), ColorLayout::premultiplied(ColorSpace::Srgb));
    }

    #[test]
    fn test_nested_node_is_a_filter() {
        let inner: Arc<dyn Filter> = Arc::new(node(CompositeRule::Over));
        let outer = CompositionNode::new(
            vec![inner, flood(0.0, 0.0, 1.0, 1.0, Rgba::new(0.0, 1.0, 0.0, 1.0))],
            CompositeRule::Over,
            ColorWorkingSpace::LinearRgb,
        );
        let r = outer.create_rendering(&RenderContext::default()).unwrap().unwrap();
        assert_eq!(r.bounds(), RectI::new(0, 0, 8, 6));
        let px = r.get_data(r.bounds());
        assert_eq!(px.pixel(0, 0), &[0, 255, 0, 255]);
        assert_eq!(px.pixel(3, 3), &[0, 0, 255, 255]);
        assert_eq!(px.pixel(1, 1), &[255, 0, 0, 255]);
    }
}
