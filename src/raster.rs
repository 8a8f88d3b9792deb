//! Device-space rasters.
//!
//! A [`Raster`] is a pull-based source of pixels over a device rectangle.
//! Callers hand it a [`PixelBuffer`] positioned anywhere; the raster fills
//! at least the part of the buffer that lies inside its own bounds.
//!
//! [`TiledRaster`] adds a regular tile grid on top, for producers that
//! compute their pixels a tile at a time.

use std::ops::Range;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::basics::{intersect_rectangles, RectI};
use crate::color::Rgba;
use crate::pixel_layout::{ColorLayout, SampleLayout};
use crate::rendering_buffer::PixelBuffer;

/// Tile period in pixels: tile grids are aligned to multiples of this, and
/// tiles are never narrower than this unless the raster itself is.
pub const TILE_PERIOD: i32 = 256;

// ============================================================================
// Raster trait
// ============================================================================

/// A source of pixel data in device space.
pub trait Raster: Send + Sync {
    /// Device rectangle covered by the raster.
    fn bounds(&self) -> RectI;

    /// Meaning of the bands of every pixel.
    fn color_layout(&self) -> ColorLayout;

    /// Preferred shape of the blocks the raster computes.
    fn sample_layout(&self) -> SampleLayout;

    /// Fill the part of `dst` inside [`bounds`](Raster::bounds). `dst` must
    /// have as many bands as the color layout.
    fn copy_data(&self, dst: &mut PixelBuffer);

    /// Pixels of `rect`, zero outside the raster's bounds.
    fn get_data(&self, rect: RectI) -> PixelBuffer {
        let mut buf = PixelBuffer::new(rect, self.color_layout().bands());
        self.copy_data(&mut buf);
        buf
    }

    /// `true` if the raster already keeps its pixels in memory.
    fn is_cached(&self) -> bool {
        false
    }
}

// ============================================================================
// TiledRaster trait
// ============================================================================

/// A raster that produces its pixels on a regular tile grid.
pub trait TiledRaster: Raster {
    /// Shape of one tile.
    fn tile_layout(&self) -> SampleLayout;

    /// Device position of tile (0, 0).
    fn tile_grid_origin(&self) -> (i32, i32);

    /// Compute tile (tx, ty).
    fn get_tile(&self, tx: i32, ty: i32) -> PixelBuffer;

    /// Device rectangle of tile (tx, ty).
    fn tile_rect(&self, tx: i32, ty: i32) -> RectI {
        let tl = self.tile_layout();
        let (gx, gy) = self.tile_grid_origin();
        RectI::from_xywh(gx + tx * tl.width, gy + ty * tl.height, tl.width, tl.height)
    }

    /// Ranges of tile indices covering the bounds.
    fn tile_indices(&self) -> (Range<i32>, Range<i32>) {
        let b = self.bounds();
        let tl = self.tile_layout();
        if b.is_empty() || tl.width <= 0 || tl.height <= 0 {
            return (0..0, 0..0);
        }
        let (gx, gy) = self.tile_grid_origin();
        let span = |lo: i32, hi: i32, origin: i32, size: i32| {
            let first = (lo - origin).div_euclid(size);
            let last = (hi - 1 - origin).div_euclid(size);
            first..last + 1
        };
        (
            span(b.x1, b.x2, gx, tl.width),
            span(b.y1, b.y2, gy, tl.height),
        )
    }
}

// ============================================================================
// BufferRaster
// ============================================================================

/// A raster backed by a pixel buffer held in memory.
#[derive(Debug, Clone)]
pub struct BufferRaster {
    buffer: Arc<PixelBuffer>,
    layout: ColorLayout,
}

impl BufferRaster {
    /// `buffer` must have as many bands as `layout`.
    pub fn new(buffer: PixelBuffer, layout: ColorLayout) -> Self {
        debug_assert_eq!(buffer.bands(), layout.bands());
        Self {
            buffer: Arc::new(buffer),
            layout,
        }
    }

    /// A raster over `bounds` with every pixel set to `px`.
    pub fn filled(bounds: RectI, layout: ColorLayout, px: &[u8]) -> Self {
        let mut buffer = PixelBuffer::new(bounds, layout.bands());
        for dp in buffer.data_mut().chunks_exact_mut(px.len()) {
            dp.copy_from_slice(px);
        }
        Self::new(buffer, layout)
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// The same pixels, moved by (dx, dy). Shares nothing mutable.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let mut buffer = (*self.buffer).clone();
        buffer.translate(dx, dy);
        Self::new(buffer, self.layout)
    }
}

impl Raster for BufferRaster {
    fn bounds(&self) -> RectI {
        self.buffer.bounds()
    }

    fn color_layout(&self) -> ColorLayout {
        self.layout
    }

    fn sample_layout(&self) -> SampleLayout {
        let b = self.buffer.bounds();
        SampleLayout::new(b.width(), b.height(), self.layout.bands())
    }

    fn copy_data(&self, dst: &mut PixelBuffer) {
        dst.copy_from(&self.buffer);
    }

    fn is_cached(&self) -> bool {
        true
    }
}

// ============================================================================
// CachedRaster
// ============================================================================

/// Caches another raster one tile period block at a time.
///
/// Blocks are aligned to multiples of [`TILE_PERIOD`] and computed on the
/// first request that touches them, so a request only pulls the blocks it
/// overlaps from the source.
pub struct CachedRaster {
    source: Arc<dyn Raster>,
    blocks: Mutex<HashMap<(i32, i32), Arc<OnceLock<PixelBuffer>>>>,
}

impl CachedRaster {
    pub fn new(source: Arc<dyn Raster>) -> Self {
        Self {
            source,
            blocks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of blocks computed or being computed.
    pub fn cached_blocks(&self) -> usize {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn block(&self, bx: i32, by: i32) -> Arc<OnceLock<PixelBuffer>> {
        let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        blocks.entry((bx, by)).or_default().clone()
    }

    fn block_rect(&self, bx: i32, by: i32) -> RectI {
        let r = RectI::from_xywh(bx * TILE_PERIOD, by * TILE_PERIOD, TILE_PERIOD, TILE_PERIOD);
        intersect_rectangles(&r, &self.source.bounds())
    }
}

impl Raster for CachedRaster {
    fn bounds(&self) -> RectI {
        self.source.bounds()
    }

    fn color_layout(&self) -> ColorLayout {
        self.source.color_layout()
    }

    fn sample_layout(&self) -> SampleLayout {
        self.source.sample_layout()
    }

    fn copy_data(&self, dst: &mut PixelBuffer) {
        let r = intersect_rectangles(&self.source.bounds(), &dst.bounds());
        if r.is_empty() {
            return;
        }
        for by in r.y1.div_euclid(TILE_PERIOD)..=(r.y2 - 1).div_euclid(TILE_PERIOD) {
            for bx in r.x1.div_euclid(TILE_PERIOD)..=(r.x2 - 1).div_euclid(TILE_PERIOD) {
                // The map lock is released before the block is computed.
                let slot = self.block(bx, by);
                let pixels = slot.get_or_init(|| {
                    let rect = self.block_rect(bx, by);
                    log::trace!("caching block ({}, {}) at {:?}", bx, by, rect);
                    self.source.get_data(rect)
                });
                dst.copy_from(pixels);
            }
        }
    }

    fn is_cached(&self) -> bool {
        true
    }
}

/// Wrap `raster` so each of its pixels is computed at most once, and only
/// when first requested.
pub fn wrap(raster: Arc<dyn Raster>) -> Arc<dyn Raster> {
    if raster.is_cached() {
        raster
    } else {
        Arc::new(CachedRaster::new(raster))
    }
}

// ============================================================================
// FloodRaster
// ============================================================================

/// A raster of a single color.
#[derive(Debug, Clone)]
pub struct FloodRaster {
    bounds: RectI,
    layout: ColorLayout,
    pixel: Vec<u8>,
}

impl FloodRaster {
    /// Flood `bounds` with the premultiplied color `color`.
    pub fn new(bounds: RectI, color: &Rgba, layout: ColorLayout) -> Self {
        let mut pixel = vec![0u8; layout.bands()];
        layout.write_premultiplied(&mut pixel, color);
        Self {
            bounds,
            layout,
            pixel,
        }
    }

    /// A fully transparent flood.
    pub fn transparent(bounds: RectI, layout: ColorLayout) -> Self {
        Self::new(bounds, &Rgba::transparent(), layout)
    }
}

impl Raster for FloodRaster {
    fn bounds(&self) -> RectI {
        self.bounds
    }

    fn color_layout(&self) -> ColorLayout {
        self.layout
    }

    fn sample_layout(&self) -> SampleLayout {
        SampleLayout::new(TILE_PERIOD, TILE_PERIOD, self.layout.bands())
    }

    fn copy_data(&self, dst: &mut PixelBuffer) {
        let r = intersect_rectangles(&self.bounds, &dst.bounds());
        if r.is_empty() {
            return;
        }
        let n = self.pixel.len();
        for y in r.y1..r.y2 {
            for dp in dst.row_span_mut(y, r.x1, r.x2).chunks_exact_mut(n) {
                dp.copy_from_slice(&self.pixel);
            }
        }
    }

    fn is_cached(&self) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_layout::ColorSpace;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRaster {
        inner: Box<dyn Raster>,
        calls: AtomicUsize,
        pixels: AtomicUsize,
    }

    impl CountingRaster {
        fn new(inner: impl Raster + 'static) -> Arc<Self> {
            Arc::new(Self {
                inner: Box::new(inner),
                calls: AtomicUsize::new(0),
                pixels: AtomicUsize::new(0),
            })
        }
    }

    impl Raster for CountingRaster {
        fn bounds(&self) -> RectI {
            self.inner.bounds()
        }
        fn color_layout(&self) -> ColorLayout {
            self.inner.color_layout()
        }
        fn sample_layout(&self) -> SampleLayout {
            self.inner.sample_layout()
        }
        fn copy_data(&self, dst: &mut PixelBuffer) {
            let r = intersect_rectangles(&self.bounds(), &dst.bounds());
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pixels.fetch_add(r.area(), Ordering::SeqCst);
            self.inner.copy_data(dst)
        }
    }

    struct Grid {
        bounds: RectI,
    }

    impl Raster for Grid {
        fn bounds(&self) -> RectI {
            self.bounds
        }
        fn color_layout(&self) -> ColorLayout {
            ColorLayout::opaque(ColorSpace::Gray)
        }
        fn sample_layout(&self) -> SampleLayout {
            SampleLayout::new(100, 50, 1)
        }
        fn copy_data(&self, _dst: &mut PixelBuffer) {}
    }

    impl TiledRaster for Grid {
        fn tile_layout(&self) -> SampleLayout {
            SampleLayout::new(100, 50, 1)
        }
        fn tile_grid_origin(&self) -> (i32, i32) {
            (-256, 0)
        }
        fn get_tile(&self, tx: i32, ty: i32) -> PixelBuffer {
            PixelBuffer::new(self.tile_rect(tx, ty), 1)
        }
    }

    fn rgba() -> ColorLayout {
        ColorLayout::straight(ColorSpace::Srgb)
    }

    #[test]
    fn test_buffer_raster_get_data_zero_outside() {
        let r = BufferRaster::filled(RectI::new(0, 0, 2, 2), rgba(), &[1, 2, 3, 4]);
        let out = r.get_data(RectI::new(1, 1, 3, 3));
        assert_eq!(out.pixel(1, 1), &[1, 2, 3, 4]);
        assert_eq!(out.pixel(2, 1), &[0, 0, 0, 0]);
        assert_eq!(out.pixel(2, 2), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_buffer_raster_translated() {
        let r = BufferRaster::filled(RectI::new(0, 0, 2, 2), rgba(), &[1, 2, 3, 4]);
        let t = r.translated(5, -1);
        assert_eq!(t.bounds(), RectI::new(5, -1, 7, 1));
        assert_eq!(r.bounds(), RectI::new(0, 0, 2, 2));
        assert_eq!(t.sample_layout(), SampleLayout::new(2, 2, 4));
    }

    #[test]
    fn test_cached_raster_materializes_once() {
        let counting = CountingRaster::new(BufferRaster::filled(
            RectI::new(0, 0, 4, 4),
            rgba(),
            &[9, 9, 9, 9],
        ));
        let cached = wrap(counting.clone());
        assert!(cached.is_cached());
        let a = cached.get_data(RectI::new(0, 0, 2, 2));
        let b = cached.get_data(RectI::new(2, 2, 4, 4));
        assert_eq!(a.pixel(1, 1), &[9, 9, 9, 9]);
        assert_eq!(b.pixel(3, 3), &[9, 9, 9, 9]);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_raster_pulls_only_touched_blocks() {
        let layout = ColorLayout::premultiplied(ColorSpace::LinearRgb);
        let counting = CountingRaster::new(FloodRaster::new(
            RectI::new(-100, 0, 2048, 2048),
            &Rgba::new(0.0, 0.5, 0.0, 0.5),
            layout,
        ));
        let cached = CachedRaster::new(counting.clone());

        let out = cached.get_data(RectI::new(10, 10, 20, 20));
        assert_eq!(out.pixel(15, 15), &[0, 128, 0, 128]);
        assert_eq!(cached.cached_blocks(), 1);
        assert_eq!(counting.pixels.load(Ordering::SeqCst), 256 * 256);

        // Straddles the origin: blocks (-1, 0) and (0, 0), one of them new.
        let out = cached.get_data(RectI::new(-10, 0, 10, 1));
        assert_eq!(out.pixel(-10, 0), &[0, 128, 0, 128]);
        assert_eq!(cached.cached_blocks(), 2);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
        assert_eq!(counting.pixels.load(Ordering::SeqCst), 256 * 256 + 100 * 256);
    }

    #[test]
    fn test_wrap_passes_cached_through() {
        let r: Arc<dyn Raster> = Arc::new(FloodRaster::transparent(RectI::new(0, 0, 1, 1), rgba()));
        let w = wrap(r.clone());
        assert!(Arc::ptr_eq(&r, &w));
    }

    #[test]
    fn test_flood_fills_overlap_only() {
        let layout = ColorLayout::premultiplied(ColorSpace::LinearRgb);
        let f = FloodRaster::new(RectI::new(0, 0, 2, 2), &Rgba::new(0.5, 0.0, 0.0, 0.5), layout);
        let out = f.get_data(RectI::new(1, 0, 3, 1));
        assert_eq!(out.pixel(1, 0), &[128, 0, 0, 128]);
        assert_eq!(out.pixel(2, 0), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_transparent_flood() {
        let f = FloodRaster::transparent(RectI::new(0, 0, 3, 3), rgba());
        let out = f.get_data(f.bounds());
        assert!(out.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tile_rect_and_indices() {
        let g = Grid {
            bounds: RectI::new(-200, 10, 150, 120),
        };
        assert_eq!(g.tile_rect(0, 0), RectI::new(-256, 0, -156, 50));
        assert_eq!(g.tile_rect(2, 1), RectI::new(-56, 50, 44, 100));
        let (xs, ys) = g.tile_indices();
        assert_eq!(xs, 0..5);
        assert_eq!(ys, 0..3);
        assert_eq!(g.get_tile(1, 1).bounds(), RectI::new(-156, 50, -56, 100));
    }

    #[test]
    fn test_tile_indices_empty_bounds() {
        let g = Grid {
            bounds: RectI::new(5, 5, 5, 9),
        };
        let (xs, ys) = g.tile_indices();
        assert!(xs.is_empty());
        assert!(ys.is_empty());
    }
}
