//! Padding a raster out to larger bounds.
//!
//! [`PadRaster`] reports a caller-chosen rectangle as its bounds and fills
//! whatever lies outside its source according to a [`PadMode`]: zeros,
//! the nearest edge pixel (clamp to edge), or the source tiled
//! (modulo wrapping). Bounds smaller than the source crop it.

use std::sync::Arc;

use crate::basics::{intersect_rectangles, RectI};
use crate::pixel_layout::{ColorLayout, SampleLayout};
use crate::raster::Raster;
use crate::rendering_buffer::PixelBuffer;

/// How pixels outside the source are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PadMode {
    /// Transparent black.
    #[default]
    Zero,
    /// Nearest edge pixel.
    Replicate,
    /// Source repeated in both directions.
    Wrap,
}

impl PadMode {
    /// Map coordinate `v` into `lo..hi`, or `None` if it falls outside and
    /// should be zero.
    #[inline]
    fn map(&self, v: i32, lo: i32, hi: i32) -> Option<i32> {
        if v >= lo && v < hi {
            return Some(v);
        }
        match self {
            PadMode::Zero => None,
            PadMode::Replicate => Some(v.clamp(lo, hi - 1)),
            PadMode::Wrap => Some(lo + (v - lo).rem_euclid(hi - lo)),
        }
    }
}

/// A raster presented over different bounds than its source.
pub struct PadRaster {
    source: Arc<dyn Raster>,
    bounds: RectI,
    mode: PadMode,
}

impl PadRaster {
    pub fn new(source: Arc<dyn Raster>, bounds: RectI, mode: PadMode) -> Self {
        Self {
            source,
            bounds,
            mode,
        }
    }

    pub fn mode(&self) -> PadMode {
        self.mode
    }

    /// The source region needed to fill `r`.
    fn source_region(&self, r: &RectI, sb: &RectI) -> RectI {
        match self.mode {
            PadMode::Zero => intersect_rectangles(r, sb),
            PadMode::Replicate => RectI::new(
                r.x1.clamp(sb.x1, sb.x2 - 1),
                r.y1.clamp(sb.y1, sb.y2 - 1),
                r.x2.clamp(sb.x1 + 1, sb.x2),
                r.y2.clamp(sb.y1 + 1, sb.y2),
            ),
            PadMode::Wrap => {
                if sb.contains_rect(r) {
                    *r
                } else {
                    *sb
                }
            }
        }
    }
}

impl Raster for PadRaster {
    fn bounds(&self) -> RectI {
        self.bounds
    }

    fn color_layout(&self) -> ColorLayout {
        self.source.color_layout()
    }

    fn sample_layout(&self) -> SampleLayout {
        self.source.sample_layout()
    }

    fn copy_data(&self, dst: &mut PixelBuffer) {
        let r = intersect_rectangles(&self.bounds, &dst.bounds());
        if r.is_empty() {
            return;
        }
        let sb = self.source.bounds();
        if sb.is_empty() {
            dst.zero_rect(&r);
            return;
        }

        let region = self.source_region(&r, &sb);
        if region.is_empty() {
            dst.zero_rect(&r);
            return;
        }
        let src = self.source.get_data(region);

        for y in r.y1..r.y2 {
            let sy = self.mode.map(y, sb.y1, sb.y2);
            for x in r.x1..r.x2 {
                let dp = dst.pixel_mut(x, y);
                match (self.mode.map(x, sb.x1, sb.x2), sy) {
                    (Some(sx), Some(sy)) => dp.copy_from_slice(src.pixel(sx, sy)),
                    _ => dp.fill(0),
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
