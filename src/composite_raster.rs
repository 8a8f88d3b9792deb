//! Tiled composite raster.
//!
//! [`TiledCompositeRaster`] composites an ordered list of device-space
//! sources under one [`CompositeRule`]. Construction only settles metadata
//! (bounds, color layout, tile grid); pixels are computed when a tile or a
//! rectangle is requested, so any number of threads may pull tiles from
//! the same raster at once.

use std::sync::Arc;

use crate::basics::{align_down, intersect_rectangles, RectI};
use crate::color_space::coerce_alpha_premultiplied;
use crate::composite_rule::{CompositeRule, OperatorContext};
use crate::error::{CompositeError, Result};
use crate::pad_raster::{PadMode, PadRaster};
use crate::pixel_layout::{ColorLayout, SampleLayout};
use crate::raster::{Raster, TiledRaster, TILE_PERIOD};
use crate::rendering_buffer::PixelBuffer;

/// Most bands a result pixel may have.
const MAX_BANDS: usize = 4;

/// Composites sources bottom to top, one tile or rectangle at a time.
pub struct TiledCompositeRaster {
    sources: Vec<Arc<dyn Raster>>,
    contexts: Vec<OperatorContext>,
    rule: CompositeRule,
    bounds: RectI,
    layout: ColorLayout,
    tile_layout: SampleLayout,
    tile_grid: (i32, i32),
}

impl TiledCompositeRaster {
    /// Build a composite of `sources`, the first of which is the base.
    ///
    /// Fails with [`CompositeError::NoSources`] for an empty list and with
    /// [`CompositeError::TooManyBands`] when the base has no alpha band and
    /// adding one would exceed four bands.
    pub fn new(sources: Vec<Arc<dyn Raster>>, rule: CompositeRule) -> Result<Self> {
        let base = sources.first().ok_or(CompositeError::NoSources)?;
        let layout = result_layout(base.color_layout())?;
        let base_sample = base.sample_layout();

        let contexts: Vec<OperatorContext> = sources
            .iter()
            .map(|s| OperatorContext::new(rule, s.color_layout(), layout))
            .collect();

        let rects: Vec<RectI> = sources.iter().map(|s| s.bounds()).collect();
        let bounds = rule
            .combine_bounds(&rects)
            .ok_or(CompositeError::NoSources)?;

        // Arithmetic sources must all cover exactly the unified bounds.
        let sources = if rule.is_arithmetic() {
            sources
                .into_iter()
                .map(|s| {
                    if s.bounds() == bounds {
                        s
                    } else {
                        Arc::new(PadRaster::new(s, bounds, PadMode::Zero)) as Arc<dyn Raster>
                    }
                })
                .collect()
        } else {
            sources
        };

        let tile_grid = (
            align_down(bounds.x1, TILE_PERIOD),
            align_down(bounds.y1, TILE_PERIOD),
        );
        let tile_layout = fix_tile_layout(&base_sample, &bounds, tile_grid, layout.bands());

        log::debug!(
            "composite raster: {} sources, {:?}, bounds {:?}, tiles {}x{} at {:?}",
            sources.len(),
            rule,
            bounds,
            tile_layout.width,
            tile_layout.height,
            tile_grid
        );

        Ok(Self {
            sources,
            contexts,
            rule,
            bounds,
            layout,
            tile_layout,
            tile_grid,
        })
    }

    pub fn rule(&self) -> CompositeRule {
        self.rule
    }

    pub fn sources(&self) -> &[Arc<dyn Raster>] {
        &self.sources
    }

    /// Operator context of each source, in source order.
    pub fn contexts(&self) -> &[OperatorContext] {
        &self.contexts
    }

    /// Composite every source into `dst`, over all of `dst`.
    ///
    /// `dst` must have as many bands as [`color_layout`](Raster::color_layout).
    /// Parts of `dst` outside the base source are zeroed first.
    pub fn gen_rect(&self, dst: &mut PixelBuffer) {
        debug_assert_eq!(dst.bands(), self.layout.bands());
        let r = dst.bounds();
        let (base, rest) = match self.sources.split_first() {
            Some(split) => split,
            None => return,
        };

        let base_bounds = base.bounds();
        if !base_bounds.contains_rect(&r) {
            dst.clear(0);
        }

        let base_layout = base.color_layout();
        if base_layout.has_alpha() {
            base.copy_data(dst);
            if !base_layout.is_alpha_premultiplied() {
                coerce_alpha_premultiplied(dst, base_layout, true);
            }
        } else {
            let inter = intersect_rectangles(&base_bounds, &r);
            if !inter.is_empty() {
                let data = base.get_data(inter);
                dst.copy_from_adding_band(&data, u8::MAX);
            }
        }

        for (src, ctx) in rest.iter().zip(self.contexts[1..].iter()) {
            let sb = src.bounds();
            if !sb.intersects(&r) {
                continue;
            }
            let data = src.get_data(intersect_rectangles(&sb, &r));
            ctx.compose(&data, dst);
        }
    }
}

impl Raster for TiledCompositeRaster {
    fn bounds(&self) -> RectI {
        self.bounds
    }

    fn color_layout(&self) -> ColorLayout {
        self.layout
    }

    fn sample_layout(&self) -> SampleLayout {
        self.tile_layout
    }

    /// Writes all of `dst`, so a rectangle matches the tiles covering it.
    fn copy_data(&self, dst: &mut PixelBuffer) {
        self.gen_rect(dst);
    }
}

impl TiledRaster for TiledCompositeRaster {
    fn tile_layout(&self) -> SampleLayout {
        self.tile_layout
    }

    fn tile_grid_origin(&self) -> (i32, i32) {
        self.tile_grid
    }

    fn get_tile(&self, tx: i32, ty: i32) -> PixelBuffer {
        let rect = self.tile_rect(tx, ty);
        log::trace!("generating tile ({}, {}) at {:?}", tx, ty, rect);
        let mut tile = PixelBuffer::new(rect, self.layout.bands());
        self.gen_rect(&mut tile);
        tile
    }
}

/// Layout of the result: the base layout made premultiplied, with an alpha
/// band added when the base has none.
fn result_layout(base: ColorLayout) -> Result<ColorLayout> {
    if base.has_alpha() {
        return Ok(base.with_alpha_premultiplied(true));
    }
    let bands = base.bands() + 1;
    if bands > MAX_BANDS {
        return Err(CompositeError::TooManyBands { bands });
    }
    Ok(ColorLayout::premultiplied(base.space()))
}

/// Tiles are at least one tile period wide unless the bounds end sooner.
fn fix_tile_layout(
    base: &SampleLayout,
    bounds: &RectI,
    grid: (i32, i32),
    bands: usize,
) -> SampleLayout {
    let fit = |size: i32, extent: i32| size.max(TILE_PERIOD).min(extent).max(1);
    SampleLayout::new(
        fit(base.width, bounds.x2 - grid.0),
        fit(base.height, bounds.y2 - grid.1),
        bands,
    )
}

// ============================================================================
// Tests
// ============================================================================
