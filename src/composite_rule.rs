//! Composite rules and the per-pixel operator that applies them.
//!
//! A [`CompositeRule`] decides three things about a composition:
//!
//! - how the bounds of the sources combine ([`CompositeRule::combine_bounds`]),
//! - what happens when a source renders nothing
//!   ([`CompositeRule::blank_source_policy`]),
//! - how two pixels combine ([`OperatorContext::compose`]).
//!
//! Sources are listed bottom to top: the accumulated result is always the
//! destination and the next source is composited onto it.

use std::ops::{Add, Sub};

use crate::basics::{intersect_rectangles, unite_rectangles, Rect};
use crate::color::Rgba;
use crate::comp_op::{blend_arithmetic, comp_op_blend, CompOp};
use crate::pixel_layout::ColorLayout;
use crate::rendering_buffer::PixelBuffer;

// ============================================================================
// CompositeRule
// ============================================================================

/// How a list of sources is composited.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompositeRule {
    /// Later sources are painted over earlier ones.
    Over,
    /// The result is visible only where every source is.
    In,
    /// Later sources are visible only where the accumulated result is not.
    Out,
    /// Later sources are painted over earlier ones, clipped to them.
    Atop,
    /// Only the parts not covered by both survive.
    Xor,
    /// `k1*S*D + k2*S + k3*D + k4` on premultiplied components.
    Arithmetic { k1: f64, k2: f64, k3: f64, k4: f64 },
}

impl Default for CompositeRule {
    fn default() -> Self {
        CompositeRule::Over
    }
}

/// What to do with a source that renders nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankSourcePolicy {
    /// The whole composition is empty.
    Abort,
    /// Drop everything accumulated so far and continue.
    ClearAccumulated,
    /// Substitute a transparent placeholder so every source is present.
    Placeholder,
    /// Leave the source out.
    Skip,
}

impl CompositeRule {
    pub fn arithmetic(k1: f64, k2: f64, k3: f64, k4: f64) -> Self {
        CompositeRule::Arithmetic { k1, k2, k3, k4 }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, CompositeRule::Arithmetic { .. })
    }

    pub fn blank_source_policy(&self) -> BlankSourcePolicy {
        match self {
            CompositeRule::In => BlankSourcePolicy::Abort,
            CompositeRule::Out => BlankSourcePolicy::ClearAccumulated,
            CompositeRule::Arithmetic { .. } => BlankSourcePolicy::Placeholder,
            CompositeRule::Over | CompositeRule::Atop | CompositeRule::Xor => {
                BlankSourcePolicy::Skip
            }
        }
    }

    /// Combine source bounds in list order.
    ///
    /// IN intersects (collapsing to a zero-sized rectangle at the running
    /// origin once two sources are disjoint), OUT takes the last source's
    /// bounds, every other rule takes the union. Returns `None` for an
    /// empty list.
    pub fn combine_bounds<T>(&self, rects: &[Rect<T>]) -> Option<Rect<T>>
    where
        T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T>,
    {
        let (first, rest) = rects.split_first()?;
        let mut acc = *first;
        for r in rest {
            acc = match self {
                CompositeRule::In => {
                    if acc.intersects(r) {
                        intersect_rectangles(&acc, r)
                    } else {
                        Rect::new(acc.x1, acc.y1, acc.x1, acc.y1)
                    }
                }
                CompositeRule::Out => *r,
                _ => unite_rectangles(&acc, r),
            };
        }
        Some(acc)
    }

    /// The Porter-Duff operation equivalent to this rule, if any.
    pub fn comp_op(&self) -> Option<CompOp> {
        match self {
            CompositeRule::Over => Some(CompOp::SrcOver),
            CompositeRule::In => Some(CompOp::SrcIn),
            CompositeRule::Out => Some(CompOp::SrcOut),
            CompositeRule::Atop => Some(CompOp::SrcAtop),
            CompositeRule::Xor => Some(CompOp::Xor),
            CompositeRule::Arithmetic { .. } => None,
        }
    }

    /// Combine premultiplied source `s` onto premultiplied destination `d`.
    #[inline]
    pub fn blend(&self, s: &Rgba, d: &Rgba) -> Rgba {
        match *self {
            CompositeRule::Arithmetic { k1, k2, k3, k4 } => blend_arithmetic(s, d, [k1, k2, k3, k4]),
            CompositeRule::Over => comp_op_blend(CompOp::SrcOver, s, d),
            CompositeRule::In => comp_op_blend(CompOp::SrcIn, s, d),
            CompositeRule::Out => comp_op_blend(CompOp::SrcOut, s, d),
            CompositeRule::Atop => comp_op_blend(CompOp::SrcAtop, s, d),
            CompositeRule::Xor => comp_op_blend(CompOp::Xor, s, d),
        }
    }
}

// ============================================================================
// OperatorContext
// ============================================================================

/// A rule bound to the layouts of one source and the destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorContext {
    rule: CompositeRule,
    src_layout: ColorLayout,
    dst_layout: ColorLayout,
}

impl OperatorContext {
    pub fn new(rule: CompositeRule, src_layout: ColorLayout, dst_layout: ColorLayout) -> Self {
        Self {
            rule,
            src_layout,
            dst_layout,
        }
    }

    pub fn rule(&self) -> CompositeRule {
        self.rule
    }

    pub fn src_layout(&self) -> ColorLayout {
        self.src_layout
    }

    pub fn dst_layout(&self) -> ColorLayout {
        self.dst_layout
    }

    /// Composite `src` onto `dst` over the region they share.
    pub fn compose(&self, src: &PixelBuffer, dst: &mut PixelBuffer) {
        let r = intersect_rectangles(&src.bounds(), &dst.bounds());
        if r.is_empty() {
            return;
        }
        let sb = self.src_layout.bands();
        let db = self.dst_layout.bands();
        debug_assert_eq!(src.bands(), sb);
        debug_assert_eq!(dst.bands(), db);

        for y in r.y1..r.y2 {
            let s_row = src.row_span(y, r.x1, r.x2);
            let d_row = dst.row_span_mut(y, r.x1, r.x2);
            for (sp, dp) in s_row.chunks_exact(sb).zip(d_row.chunks_exact_mut(db)) {
                let s = self.src_layout.read_premultiplied(sp);
                let d = self.dst_layout.read_premultiplied(dp);
                let out = self.rule.blend(&s, &d);
                self.dst_layout.write_premultiplied(dp, &out);
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
    use crate::basics::{RectD, RectI};
    use crate::pixel_layout::ColorSpace;

    #[test]
    fn test_default_rule() {
        assert_eq!(CompositeRule::default(), CompositeRule::Over);
    }

    #[test]
    fn test_blank_policies() {
        assert_eq!(CompositeRule::In.blank_source_policy(), BlankSourcePolicy::Abort);
        assert_eq!(
            CompositeRule::Out.blank_source_policy(),
            BlankSourcePolicy::ClearAccumulated
        );
        assert_eq!(
            CompositeRule::arithmetic(0.0, 1.0, 1.0, 0.0).blank_source_policy(),
            BlankSourcePolicy::Placeholder
        );
        for rule in [CompositeRule::Over, CompositeRule::Atop, CompositeRule::Xor] {
            assert_eq!(rule.blank_source_policy(), BlankSourcePolicy::Skip);
        }
    }

    #[test]
    fn test_combine_bounds_empty_list() {
        let rects: [RectI; 0] = [];
        assert_eq!(CompositeRule::Over.combine_bounds(&rects), None);
    }

    #[test]
    fn test_combine_bounds_union() {
        let rects = [RectI::new(0, 0, 10, 10), RectI::new(5, -5, 20, 8)];
        assert_eq!(
            CompositeRule::Over.combine_bounds(&rects),
            Some(RectI::new(0, -5, 20, 10))
        );
        assert_eq!(
            CompositeRule::arithmetic(0.0, 0.0, 0.0, 0.0).combine_bounds(&rects),
            Some(RectI::new(0, -5, 20, 10))
        );
        assert_eq!(
            CompositeRule::Xor.combine_bounds(&rects),
            Some(RectI::new(0, -5, 20, 10))
        );
    }

    #[test]
    fn test_combine_bounds_in() {
        let rects = [RectI::new(0, 0, 10, 10), RectI::new(5, 5, 20, 20)];
        assert_eq!(
            CompositeRule::In.combine_bounds(&rects),
            Some(RectI::new(5, 5, 10, 10))
        );
    }

    #[test]
    fn test_combine_bounds_in_disjoint_collapses() {
        let rects = [
            RectI::new(0, 0, 10, 10),
            RectI::new(20, 20, 30, 30),
            RectI::new(0, 0, 10, 10),
        ];
        let r = CompositeRule::In.combine_bounds(&rects).unwrap();
        assert_eq!(r, RectI::new(0, 0, 0, 0));
        assert!(r.is_empty());
    }

    #[test]
    fn test_combine_bounds_in_touching_edges_is_disjoint() {
        let rects = [RectD::new(0.0, 0.0, 1.0, 1.0), RectD::new(1.0, 0.0, 2.0, 1.0)];
        let r = CompositeRule::In.combine_bounds(&rects).unwrap();
        assert_eq!(r, RectD::new(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_combine_bounds_out_takes_last() {
        let rects = [RectI::new(0, 0, 10, 10), RectI::new(50, 50, 60, 70)];
        assert_eq!(
            CompositeRule::Out.combine_bounds(&rects),
            Some(RectI::new(50, 50, 60, 70))
        );
    }

    #[test]
    fn test_comp_op_mapping() {
        assert_eq!(CompositeRule::Over.comp_op(), Some(CompOp::SrcOver));
        assert_eq!(CompositeRule::Atop.comp_op(), Some(CompOp::SrcAtop));
        assert_eq!(CompositeRule::arithmetic(1.0, 0.0, 0.0, 0.0).comp_op(), None);
    }

    #[test]
    fn test_compose_over_straight_source() {
        let dst_layout = ColorLayout::premultiplied(ColorSpace::LinearRgb);
        let src_layout = ColorLayout::straight(ColorSpace::LinearRgb);
        let ctx = OperatorContext::new(CompositeRule::Over, src_layout, dst_layout);

        let mut dst = PixelBuffer::new(RectI::new(0, 0, 2, 1), 4);
        dst.data_mut().copy_from_slice(&[255, 0, 0, 255, 255, 0, 0, 255]);
        // Half-transparent blue covering only the second pixel.
        let src = PixelBuffer::from_vec(RectI::new(1, 0, 2, 1), 4, vec![0, 0, 255, 128]).unwrap();

        ctx.compose(&src, &mut dst);
        assert_eq!(dst.pixel(0, 0), &[255, 0, 0, 255]);
        assert_eq!(dst.pixel(1, 0), &[127, 0, 128, 255]);
    }

    #[test]
    fn test_compose_in_and_out() {
        let l = ColorLayout::premultiplied(ColorSpace::LinearRgb);
        let src = PixelBuffer::from_vec(RectI::new(0, 0, 1, 1), 4, vec![0, 255, 0, 255]).unwrap();

        let mut dst = PixelBuffer::from_vec(RectI::new(0, 0, 1, 1), 4, vec![0, 0, 0, 0]).unwrap();
        OperatorContext::new(CompositeRule::In, l, l).compose(&src, &mut dst);
        assert_eq!(dst.pixel(0, 0), &[0, 0, 0, 0]);

        let mut dst = PixelBuffer::from_vec(RectI::new(0, 0, 1, 1), 4, vec![0, 0, 0, 0]).unwrap();
        OperatorContext::new(CompositeRule::Out, l, l).compose(&src, &mut dst);
        assert_eq!(dst.pixel(0, 0), &[0, 255, 0, 255]);
    }

    #[test]
    fn test_compose_xor_opaque_clears() {
        let l = ColorLayout::premultiplied(ColorSpace::Srgb);
        let src = PixelBuffer::from_vec(RectI::new(0, 0, 1, 1), 4, vec![0, 0, 255, 255]).unwrap();
        let mut dst =
            PixelBuffer::from_vec(RectI::new(0, 0, 1, 1), 4, vec![255, 0, 0, 255]).unwrap();
        OperatorContext::new(CompositeRule::Xor, l, l).compose(&src, &mut dst);
        assert_eq!(dst.pixel(0, 0), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_compose_arithmetic_sum() {
        let l = ColorLayout::premultiplied(ColorSpace::LinearRgb);
        let rule = CompositeRule::arithmetic(0.0, 1.0, 1.0, 0.0);
        let src = PixelBuffer::from_vec(RectI::new(0, 0, 1, 1), 4, vec![0, 0, 255, 255]).unwrap();
        let mut dst =
            PixelBuffer::from_vec(RectI::new(0, 0, 1, 1), 4, vec![255, 0, 0, 255]).unwrap();
        OperatorContext::new(rule, l, l).compose(&src, &mut dst);
        assert_eq!(dst.pixel(0, 0), &[255, 0, 255, 255]);
    }

    #[test]
    fn test_compose_disjoint_is_noop() {
        let l = ColorLayout::premultiplied(ColorSpace::LinearRgb);
        let src = PixelBuffer::from_vec(RectI::new(5, 5, 6, 6), 4, vec![9, 9, 9, 9]).unwrap();
        let mut dst = PixelBuffer::new(RectI::new(0, 0, 2, 2), 4);
        OperatorContext::new(CompositeRule::Over, l, l).compose(&src, &mut dst);
        assert!(dst.data().iter().all(|&b| b == 0));
    }
}
