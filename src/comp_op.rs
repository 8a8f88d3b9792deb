//! Porter-Duff compositing operations on premultiplied colors.
//!
//! [`CompOp`] is the blend mode of a destination [`Surface`]; the
//! per-operation functions are shared with the composite rules, which map
//! onto the `Src*` family (the later source is the "source", the result
//! accumulated so far is the "destination").
//!
//! All colors are premultiplied f64 RGBA in `[0, 1]`.
//!
//! [`Surface`]: crate::surface::Surface

use crate::color::Rgba;

// ============================================================================
// CompOp enum: Porter-Duff compositing modes
// ============================================================================

/// Porter-Duff compositing operation.
///
/// Each variant corresponds to a formula from Porter and Duff's
/// compositing algebra, with `S` the incoming color and `D` the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CompOp {
    Clear = 0,
    Src = 1,
    Dst = 2,
    SrcOver = 3,
    DstOver = 4,
    SrcIn = 5,
    DstIn = 6,
    SrcOut = 7,
    DstOut = 8,
    SrcAtop = 9,
    DstAtop = 10,
    Xor = 11,
    Plus = 12,
}

impl Default for CompOp {
    fn default() -> Self {
        CompOp::SrcOver
    }
}

/// Blend premultiplied source `s` onto premultiplied destination `d`.
#[inline]
pub fn comp_op_blend(op: CompOp, s: &Rgba, d: &Rgba) -> Rgba {
    match op {
        CompOp::Clear => Rgba::transparent(),
        CompOp::Src => *s,
        CompOp::Dst => *d,
        CompOp::SrcOver => blend_src_over(s, d),
        CompOp::DstOver => blend_src_over(d, s),
        CompOp::SrcIn => blend_src_in(s, d),
        CompOp::DstIn => blend_src_in(d, s),
        CompOp::SrcOut => blend_src_out(s, d),
        CompOp::DstOut => blend_src_out(d, s),
        CompOp::SrcAtop => blend_src_atop(s, d),
        CompOp::DstAtop => blend_src_atop(d, s),
        CompOp::Xor => blend_xor(s, d),
        CompOp::Plus => blend_plus(s, d),
    }
}

// ---- SrcOver: Dca' = Sca + Dca.(1 - Sa)
#[inline]
fn blend_src_over(s: &Rgba, d: &Rgba) -> Rgba {
    let s1a = 1.0 - s.a;
    Rgba::new(
        s.r + d.r * s1a,
        s.g + d.g * s1a,
        s.b + d.b * s1a,
        s.a + d.a * s1a,
    )
}

// ---- SrcIn: Dca' = Sca.Da
#[inline]
fn blend_src_in(s: &Rgba, d: &Rgba) -> Rgba {
    Rgba::new(s.r * d.a, s.g * d.a, s.b * d.a, s.a * d.a)
}

// ---- SrcOut: Dca' = Sca.(1 - Da)
#[inline]
fn blend_src_out(s: &Rgba, d: &Rgba) -> Rgba {
    let d1a = 1.0 - d.a;
    Rgba::new(s.r * d1a, s.g * d1a, s.b * d1a, s.a * d1a)
}

// ---- SrcAtop: Dca' = Sca.Da + Dca.(1 - Sa), Da' = Da
#[inline]
fn blend_src_atop(s: &Rgba, d: &Rgba) -> Rgba {
    let s1a = 1.0 - s.a;
    Rgba::new(
        s.r * d.a + d.r * s1a,
        s.g * d.a + d.g * s1a,
        s.b * d.a + d.b * s1a,
        d.a,
    )
}

// ---- Xor: Dca' = Sca.(1 - Da) + Dca.(1 - Sa)
#[inline]
fn blend_xor(s: &Rgba, d: &Rgba) -> Rgba {
    let s1a = 1.0 - s.a;
    let d1a = 1.0 - d.a;
    Rgba::new(
        s.r * d1a + d.r * s1a,
        s.g * d1a + d.g * s1a,
        s.b * d1a + d.b * s1a,
        s.a + d.a - 2.0 * s.a * d.a,
    )
}

// ---- Plus: Dca' = Sca + Dca (clamped)
#[inline]
fn blend_plus(s: &Rgba, d: &Rgba) -> Rgba {
    let a = (d.a + s.a).min(1.0);
    let mut out = Rgba::new(
        (d.r + s.r).min(a),
        (d.g + s.g).min(a),
        (d.b + s.b).min(a),
        a,
    );
    out.clip();
    out
}

/// Arithmetic combination `k1.S.D + k2.S + k3.D + k4`, applied to every
/// premultiplied component and clamped to a valid premultiplied color.
#[inline]
pub fn blend_arithmetic(s: &Rgba, d: &Rgba, k: [f64; 4]) -> Rgba {
    let f = |sc: f64, dc: f64| k[0] * sc * dc + k[1] * sc + k[2] * dc + k[3];
    let mut out = Rgba::new(f(s.r, d.r), f(s.g, d.g), f(s.b, d.b), f(s.a, d.a));
    out.clip();
    out.clip_to_alpha();
    out
}

// ============================================================================
// Tests
// ============================================================================
