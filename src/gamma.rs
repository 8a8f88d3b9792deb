//! sRGB transfer functions and 8-bit lookup tables.
//!
//! Pixel data is stored with 8 bits per sample, so conversions between the
//! gamma-encoded sRGB space and linear RGB go through two 256-entry tables
//! built once per process.

use std::sync::OnceLock;

use crate::basics::uround;

// ============================================================================
// sRGB conversion functions
// ============================================================================

/// Convert sRGB value (0..1) to linear.
#[inline]
pub fn srgb_to_linear(x: f64) -> f64 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert linear value (0..1) to sRGB.
#[inline]
pub fn linear_to_srgb(x: f64) -> f64 {
    if x <= 0.0031308 {
        x * 12.92
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

// ============================================================================
// sRGB LUT
// ============================================================================

/// Lookup tables mapping 8-bit samples between sRGB and linear RGB.
pub struct SrgbLut {
    to_linear: [u8; 256],
    to_srgb: [u8; 256],
}

impl SrgbLut {
    fn build() -> Self {
        let mut to_linear = [0u8; 256];
        let mut to_srgb = [0u8; 256];
        for i in 0..256 {
            let x = i as f64 / 255.0;
            to_linear[i] = uround(srgb_to_linear(x) * 255.0) as u8;
            to_srgb[i] = uround(linear_to_srgb(x) * 255.0) as u8;
        }
        Self { to_linear, to_srgb }
    }

    /// Shared tables, built on first use.
    pub fn get() -> &'static SrgbLut {
        static LUT: OnceLock<SrgbLut> = OnceLock::new();
        LUT.get_or_init(Self::build)
    }

    /// Gamma-encoded sample → linear sample.
    #[inline]
    pub fn to_linear(&self, v: u8) -> u8 {
        self.to_linear[v as usize]
    }

    /// Linear sample → gamma-encoded sample.
    #[inline]
    pub fn to_srgb(&self, v: u8) -> u8 {
        self.to_srgb[v as usize]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_srgb_roundtrip() {
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            let linear = srgb_to_linear(x);
            let back = linear_to_srgb(linear);
            assert!(
                (x - back).abs() < 1e-6,
                "sRGB roundtrip failed for x={}: got {}",
                x,
                back
            );
        }
    }

    #[test]
    fn test_srgb_endpoints() {
        assert!((srgb_to_linear(0.0)).abs() < EPSILON);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < EPSILON);
        assert!((linear_to_srgb(0.0)).abs() < EPSILON);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_lut_endpoints() {
        let lut = SrgbLut::get();
        assert_eq!(lut.to_linear(0), 0);
        assert_eq!(lut.to_linear(255), 255);
        assert_eq!(lut.to_srgb(0), 0);
        assert_eq!(lut.to_srgb(255), 255);
    }

    #[test]
    fn test_lut_midpoint() {
        let lut = SrgbLut::get();
        // sRGB 50% grey is about 21.4% linear.
        let l = lut.to_linear(128);
        assert!((l as i32 - 55).abs() <= 1, "to_linear(128) = {}", l);
        // Linear 50% is about 73.5% sRGB.
        let s = lut.to_srgb(128);
        assert!((s as i32 - 188).abs() <= 1, "to_srgb(128) = {}", s);
    }

    #[test]
    fn test_lut_is_monotonic() {
        let lut = SrgbLut::get();
        for v in 1..=255u8 {
            assert!(lut.to_linear(v) >= lut.to_linear(v - 1));
            assert!(lut.to_srgb(v) >= lut.to_srgb(v - 1));
        }
    }

    #[test]
    fn test_lut_roundtrip_from_linear() {
        // Linear → sRGB → linear stays close for 8-bit data; the sRGB side
        // has more resolution in the darks and slightly less in the lights.
        let lut = SrgbLut::get();
        for v in 0..=255u8 {
            let back = lut.to_linear(lut.to_srgb(v));
            assert!(
                (v as i32 - back as i32).abs() <= 2,
                "roundtrip failed for v={}: got {}",
                v,
                back
            );
        }
    }
}
