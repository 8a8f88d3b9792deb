//! Affine transformation matrix.
//!
//! Maps user space (where filters and areas of interest live) to device
//! space (where rasters and pixel buffers live).

use crate::basics::{RectD, RectI};

/// Epsilon for affine matrix comparisons.
pub const AFFINE_EPSILON: f64 = 1e-14;

#[inline]
fn is_equal_eps(v1: f64, v2: f64, epsilon: f64) -> bool {
    (v1 - v2).abs() <= epsilon
}

/// 2D affine transformation matrix.
///
/// Stores six components: `[sx, shy, shx, sy, tx, ty]` representing the
/// matrix:
///
/// ```text
///   | sx  shx tx |
///   | shy  sy ty |
///   |  0    0  1 |
/// ```
///
/// Transform: `x' = x*sx + y*shx + tx`, `y' = x*shy + y*sy + ty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransAffine {
    pub sx: f64,
    pub shy: f64,
    pub shx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl TransAffine {
    /// Identity matrix.
    pub fn new() -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Custom matrix from six components.
    pub fn new_custom(sx: f64, shy: f64, shx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self {
            sx,
            shy,
            shx,
            sy,
            tx,
            ty,
        }
    }

    /// Non-uniform scaling matrix.
    pub fn new_scaling(x: f64, y: f64) -> Self {
        Self::new_custom(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    /// Translation matrix.
    pub fn new_translation(x: f64, y: f64) -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.tx += x;
        self.ty += y;
        self
    }

    pub fn transform(&self, x: &mut f64, y: &mut f64) {
        let tmp = *x;
        *x = tmp * self.sx + *y * self.shx + self.tx;
        *y = tmp * self.shy + *y * self.sy + self.ty;
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.is_translation(epsilon)
            && is_equal_eps(self.tx, 0.0, epsilon)
            && is_equal_eps(self.ty, 0.0, epsilon)
    }

    /// Returns `true` if the matrix only translates.
    pub fn is_translation(&self, epsilon: f64) -> bool {
        is_equal_eps(self.sx, 1.0, epsilon)
            && is_equal_eps(self.shy, 0.0, epsilon)
            && is_equal_eps(self.shx, 0.0, epsilon)
            && is_equal_eps(self.sy, 1.0, epsilon)
    }

    /// The translation as whole pixels, if the matrix is a pure translation
    /// by integer offsets.
    pub fn integer_translation(&self) -> Option<(i32, i32)> {
        if !self.is_translation(AFFINE_EPSILON) {
            return None;
        }
        let (dx, dy) = (self.tx.round(), self.ty.round());
        if is_equal_eps(self.tx, dx, 1e-9) && is_equal_eps(self.ty, dy, 1e-9) {
            Some((dx as i32, dy as i32))
        } else {
            None
        }
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    /// Axis-aligned bounding box of `r` after transformation.
    pub fn transform_rect(&self, r: &RectD) -> RectD {
        let corners = [(r.x1, r.y1), (r.x2, r.y1), (r.x2, r.y2), (r.x1, r.y2)];
        let mut out = RectD::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for &(cx, cy) in &corners {
            let (mut x, mut y) = (cx, cy);
            self.transform(&mut x, &mut y);
            out.x1 = out.x1.min(x);
            out.y1 = out.y1.min(y);
            out.x2 = out.x2.max(x);
            out.y2 = out.y2.max(y);
        }
        out
    }

    /// Device-space pixel rectangle covering `r`.
    pub fn transform_rect_to_device(&self, r: &RectD) -> RectI {
        self.transform_rect(r).to_enclosing_rect_i()
    }
}

impl Default for TransAffine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
