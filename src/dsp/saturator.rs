//! # Saturation
//!
//! Sits at the end of the wet path, before the feedback tap. Besides adding
//! character it is what keeps the loop bounded: with repeats above unity
//! the loop gain exceeds 1, and only the saturator's ceiling stops the
//! repeats from growing forever.
//!
//! Two curves, picked by the color region:
//!
//! - **Asymmetric** (dark, bbd, tape): a tanh with a DC bias, shifted back
//!   so that 0 still maps to 0. Positive and negative halves clip at
//!   different levels, which adds even harmonics like tape or a BBD.
//! - **Soft** (bright, crisp): clean below unity, exponential knee above.
//!   Odd-symmetric, so only odd harmonics and only on peaks.

/// Input drive for the asymmetric curve.
const ASYMMETRIC_DRIVE: f32 = 1.5;
/// DC offset applied before the tanh.
const ASYMMETRIC_BIAS: f32 = 0.2;
/// Input drive for the soft curve.
const SOFT_DRIVE: f32 = 1.2;

/// Colors at or above this use the soft symmetric curve.
pub const SOFT_COLOR_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saturator {
    Asymmetric,
    Soft,
}

impl Saturator {
    pub fn for_color(color: f32) -> Self {
        if color < SOFT_COLOR_THRESHOLD {
            Self::Asymmetric
        } else {
            Self::Soft
        }
    }

    /// Steepest slope of the curve. No input is amplified by more than
    /// this, so it bounds the saturator's share of the loop gain.
    pub fn max_slope(self) -> f32 {
        match self {
            // d/dx tanh((1.5x + 0.2)·1.5) peaks at 1.5² where the tanh
            // argument crosses zero.
            Self::Asymmetric => ASYMMETRIC_DRIVE * ASYMMETRIC_DRIVE,
            Self::Soft => SOFT_DRIVE,
        }
    }

    #[inline]
    pub fn process(self, x: f32) -> f32 {
        match self {
            Self::Asymmetric => asymmetric(x),
            Self::Soft => soft_clip(x * SOFT_DRIVE),
        }
    }
}

/// `tanh((x·1.5 + 0.2)·1.5) − tanh(0.2·1.5)`.
#[inline]
fn asymmetric(x: f32) -> f32 {
    let shifted = x * ASYMMETRIC_DRIVE + ASYMMETRIC_BIAS;
    // Both terms go through the same expression so that x = 0 cancels
    // to exactly 0.0 rather than a rounding residue.
    (shifted * ASYMMETRIC_DRIVE).tanh() - (ASYMMETRIC_BIAS * ASYMMETRIC_DRIVE).tanh()
}

/// Identity inside ±1, `1 − e^{−(|v|−1)}` beyond, sign preserved.
#[inline]
fn soft_clip(v: f32) -> f32 {
    let magnitude = v.abs();
    if magnitude <= 1.0 {
        v
    } else {
        (1.0 - (-(magnitude - 1.0)).exp()).copysign(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_maps_to_zero() {
        assert_eq!(Saturator::Asymmetric.process(0.0), 0.0);
        assert_eq!(Saturator::Soft.process(0.0), 0.0);
    }

    #[test]
    fn test_soft_curve_is_odd() {
        for i in 0..=400 {
            let x = i as f32 * 0.025;
            let pos = Saturator::Soft.process(x);
            let neg = Saturator::Soft.process(-x);
            assert_eq!(neg, -pos, "sat(-{x}) != -sat({x})");
        }
    }

    #[test]
    fn test_soft_curve_is_linear_below_knee() {
        let y = Saturator::Soft.process(0.5);
        assert!((y - 0.6).abs() < 1e-6, "0.5 · 1.2 should pass clean, got {y}");
    }

    /// Note that the knee sits at |v| = 1 and the exponential branch
    /// restarts from 0, so the soft curve is not continuous there. That is
    /// the character of the curve; it only matters that it stays bounded.
    #[test]
    fn test_both_curves_are_bounded() {
        for i in -1000..=1000 {
            let x = i as f32 * 0.1;
            let a = Saturator::Asymmetric.process(x);
            let s = Saturator::Soft.process(x);
            assert!(a.abs() < 1.3, "asymmetric({x}) = {a}");
            assert!(s.abs() <= 1.0, "soft({x}) = {s}");
        }
    }

    #[test]
    fn test_asymmetric_clips_unevenly() {
        let top = Saturator::Asymmetric.process(100.0);
        let bottom = Saturator::Asymmetric.process(-100.0);
        assert!(top > 0.0 && bottom < 0.0);
        assert!(
            (top + bottom).abs() > 0.1,
            "ceilings should differ: {top} vs {bottom}"
        );
    }

    #[test]
    fn test_curve_follows_color() {
        assert_eq!(Saturator::for_color(0.0), Saturator::Asymmetric);
        assert_eq!(Saturator::for_color(0.59), Saturator::Asymmetric);
        assert_eq!(Saturator::for_color(0.6), Saturator::Soft);
        assert_eq!(Saturator::for_color(1.0), Saturator::Soft);
    }

    #[test]
    fn test_max_slope_bounds_the_curves() {
        for curve in [Saturator::Asymmetric, Saturator::Soft] {
            let limit = curve.max_slope();
            let h = 1e-3;
            for i in -300..300 {
                let x = i as f32 * 0.01;
                // Skip the soft curve's knee, where it jumps.
                if curve == Saturator::Soft && ((x * SOFT_DRIVE).abs() - 1.0).abs() < 0.01 {
                    continue;
                }
                let slope = (curve.process(x + h) - curve.process(x - h)) / (2.0 * h);
                assert!(slope <= limit * 1.01, "{curve:?} slope {slope} at {x} exceeds {limit}");
            }
        }
        // Small signals see roughly that gain.
        let y = Saturator::Asymmetric.process(1e-3);
        assert!(y / 1e-3 > 2.0, "small-signal gain {}", y / 1e-3);
    }
}
