//! Rendering buffer: owned, positioned pixel storage.
//!
//! A [`PixelBuffer`] holds interleaved 8-bit samples for every pixel of a
//! device-space rectangle. Coordinates passed to its accessors are absolute
//! device coordinates, not offsets into the buffer, so a buffer can stand
//! for any tile or sub-rectangle of a larger raster.
//!
//! The buffer carries no color semantics; the meaning of each band comes
//! from the [`ColorLayout`](crate::pixel_layout::ColorLayout) of the raster
//! that fills it.

use crate::basics::{intersect_rectangles, RectI};

// ============================================================================
// PixelBuffer
// ============================================================================

/// Interleaved 8-bit pixel samples positioned at a device rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    bounds: RectI,
    bands: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a zero-filled buffer covering `bounds`.
    ///
    /// An empty or inverted rectangle yields a buffer with no pixels at the
    /// rectangle's origin.
    pub fn new(bounds: RectI, bands: usize) -> Self {
        let bounds = Self::normalized(bounds);
        let len = bounds.area() * bands;
        Self {
            bounds,
            bands,
            data: vec![0; len],
        }
    }

    /// Wrap existing sample data. Returns `None` when `data` does not hold
    /// exactly `area * bands` samples.
    pub fn from_vec(bounds: RectI, bands: usize, data: Vec<u8>) -> Option<Self> {
        let bounds = Self::normalized(bounds);
        if data.len() != bounds.area() * bands {
            return None;
        }
        Some(Self {
            bounds,
            bands,
            data,
        })
    }

    fn normalized(r: RectI) -> RectI {
        RectI::new(r.x1, r.y1, r.x2.max(r.x1), r.y2.max(r.y1))
    }

    pub fn bounds(&self) -> RectI {
        self.bounds
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn width(&self) -> u32 {
        self.bounds.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.bounds.height() as u32
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.bounds.width() as usize * self.bands
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Move the buffer to a new position without touching its samples.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.bounds = self.bounds.translated(dx, dy);
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        debug_assert!(
            self.bounds.hit_test(x, y),
            "pixel ({}, {}) outside {:?}",
            x,
            y,
            self.bounds
        );
        (y - self.bounds.y1) as usize * self.stride() + (x - self.bounds.x1) as usize * self.bands
    }

    /// Samples of the pixel at absolute (x, y).
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let off = self.offset(x, y);
        &self.data[off..off + self.bands]
    }

    pub fn pixel_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let off = self.offset(x, y);
        let bands = self.bands;
        &mut self.data[off..off + bands]
    }

    /// Samples of pixels `x1..x2` on row `y` (absolute coordinates).
    pub fn row_span(&self, y: i32, x1: i32, x2: i32) -> &[u8] {
        let off = self.offset(x1, y);
        &self.data[off..off + (x2 - x1) as usize * self.bands]
    }

    pub fn row_span_mut(&mut self, y: i32, x1: i32, x2: i32) -> &mut [u8] {
        let off = self.offset(x1, y);
        let len = (x2 - x1) as usize * self.bands;
        &mut self.data[off..off + len]
    }

    /// Fill every sample with `value`.
    pub fn clear(&mut self, value: u8) {
        for byte in self.data.iter_mut() {
            *byte = value;
        }
    }

    /// Zero the part of `rect` that lies inside this buffer.
    pub fn zero_rect(&mut self, rect: &RectI) {
        let r = intersect_rectangles(rect, &self.bounds);
        if r.is_empty() {
            return;
        }
        for y in r.y1..r.y2 {
            for byte in self.row_span_mut(y, r.x1, r.x2).iter_mut() {
                *byte = 0;
            }
        }
    }

    /// Copy the overlapping region of `src`. Both buffers must have the
    /// same band count.
    pub fn copy_from(&mut self, src: &PixelBuffer) {
        debug_assert_eq!(self.bands, src.bands);
        let r = intersect_rectangles(&self.bounds, &src.bounds);
        if r.is_empty() {
            return;
        }
        for y in r.y1..r.y2 {
            self.row_span_mut(y, r.x1, r.x2)
                .copy_from_slice(src.row_span(y, r.x1, r.x2));
        }
    }

    /// Copy the overlapping region of `src`, which has one band fewer than
    /// this buffer, filling the trailing (alpha) band with `alpha`.
    pub fn copy_from_adding_band(&mut self, src: &PixelBuffer, alpha: u8) {
        debug_assert_eq!(self.bands, src.bands + 1);
        let r = intersect_rectangles(&self.bounds, &src.bounds);
        if r.is_empty() {
            return;
        }
        let sb = src.bands;
        for y in r.y1..r.y2 {
            let s = src.row_span(y, r.x1, r.x2);
            let d = self.row_span_mut(y, r.x1, r.x2);
            for (dp, sp) in d.chunks_exact_mut(sb + 1).zip(s.chunks_exact(sb)) {
                dp[..sb].copy_from_slice(sp);
                dp[sb] = alpha;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
