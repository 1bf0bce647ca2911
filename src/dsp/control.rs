//! # Control Parameters
//!
//! The kernel takes its 13 controls as one typed struct per render block.
//! Each control states explicitly whether it holds a single value for the
//! whole block or one value per sample:
//!
//! ```text
//! ParameterSet {
//!     zone:  Constant(1.0),
//!     rate:  PerSample(&[0.50, 0.51, 0.52, ...]),   // a knob being moved
//!     hold:  Constant(false),
//!     ...
//! }
//! ```
//!
//! Per sample the kernel collapses the set into a [`FrameParams`], a plain
//! bag of resolved values, and clamps it with [`FrameParams::sanitized`].

/// One control for one render block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control<'a, T> {
    /// The same value for every sample of the block.
    Constant(T),
    /// One value per sample. Must be at least as long as the block.
    PerSample(&'a [T]),
}

impl<'a, T: Copy> Control<'a, T> {
    /// Value at sample `index`, or `None` if a per-sample array is too short.
    #[inline]
    pub fn at(&self, index: usize) -> Option<T> {
        match self {
            Control::Constant(value) => Some(*value),
            Control::PerSample(values) => values.get(index).copied(),
        }
    }

    /// Whether this control has a value for every sample of a block.
    pub fn covers(&self, block_len: usize) -> bool {
        match self {
            Control::Constant(_) => true,
            Control::PerSample(values) => values.len() >= block_len,
        }
    }
}

/// Resolved control values for a single sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    /// Delay range selector, floored to `0..=3`.
    pub zone: f32,
    /// Position within the zone, `0..=1`.
    pub rate: f32,
    /// μRate modulation depth, `0..=1`.
    pub micro_rate: f32,
    /// μRate LFO frequency in Hz, `0.1..=8`.
    pub micro_rate_freq: f32,
    /// Opposite L/R delay offset, `-1..=1`.
    pub skew: f32,
    /// Feedback amount, `0..=1.2`.
    pub repeats: f32,
    /// Filter character, `0..=1`.
    pub color: f32,
    /// Diffusion amount, `0..=1`.
    pub halo: f32,
    /// Dry/wet, `0..=1`.
    pub mix: f32,
    pub hold: bool,
    pub flip: bool,
    pub ping_pong: bool,
    pub swap: bool,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            zone: 1.0,
            rate: 0.5,
            micro_rate: 0.0,
            micro_rate_freq: 2.0,
            skew: 0.0,
            repeats: 0.3,
            color: 0.5,
            halo: 0.0,
            mix: 0.5,
            hold: false,
            flip: false,
            ping_pong: false,
            swap: false,
        }
    }
}

/// Clamp into `[min, max]`, replacing NaN and infinities with `default`.
#[inline]
fn bounded(value: f32, min: f32, max: f32, default: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

impl FrameParams {
    /// Every field clamped to its documented range. Non-finite values fall
    /// back to the default for that control.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            zone: bounded(self.zone, 0.0, 3.0, d.zone).floor(),
            rate: bounded(self.rate, 0.0, 1.0, d.rate),
            micro_rate: bounded(self.micro_rate, 0.0, 1.0, d.micro_rate),
            micro_rate_freq: bounded(self.micro_rate_freq, 0.1, 8.0, d.micro_rate_freq),
            skew: bounded(self.skew, -1.0, 1.0, d.skew),
            repeats: bounded(self.repeats, 0.0, 1.2, d.repeats),
            color: bounded(self.color, 0.0, 1.0, d.color),
            halo: bounded(self.halo, 0.0, 1.0, d.halo),
            mix: bounded(self.mix, 0.0, 1.0, d.mix),
            ..*self
        }
    }

    /// Point zone and rate at an absolute delay time in seconds.
    pub fn with_delay_time(mut self, seconds: f32) -> Self {
        let (zone, rate) = super::delay_time::Zone::locate(seconds);
        self.zone = zone.index() as f32;
        self.rate = rate;
        self
    }
}

/// All 13 controls for one render block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet<'a> {
    pub zone: Control<'a, f32>,
    pub rate: Control<'a, f32>,
    pub micro_rate: Control<'a, f32>,
    pub micro_rate_freq: Control<'a, f32>,
    pub skew: Control<'a, f32>,
    pub repeats: Control<'a, f32>,
    pub color: Control<'a, f32>,
    pub halo: Control<'a, f32>,
    pub mix: Control<'a, f32>,
    pub hold: Control<'a, bool>,
    pub flip: Control<'a, bool>,
    pub ping_pong: Control<'a, bool>,
    pub swap: Control<'a, bool>,
}

impl Default for ParameterSet<'_> {
    fn default() -> Self {
        Self::constant(FrameParams::default())
    }
}

impl<'a> ParameterSet<'a> {
    /// Every control block-constant at the given values.
    pub fn constant(frame: FrameParams) -> Self {
        Self {
            zone: Control::Constant(frame.zone),
            rate: Control::Constant(frame.rate),
            micro_rate: Control::Constant(frame.micro_rate),
            micro_rate_freq: Control::Constant(frame.micro_rate_freq),
            skew: Control::Constant(frame.skew),
            repeats: Control::Constant(frame.repeats),
            color: Control::Constant(frame.color),
            halo: Control::Constant(frame.halo),
            mix: Control::Constant(frame.mix),
            hold: Control::Constant(frame.hold),
            flip: Control::Constant(frame.flip),
            ping_pong: Control::Constant(frame.ping_pong),
            swap: Control::Constant(frame.swap),
        }
    }

    /// Whether every per-sample control is long enough for `block_len`.
    pub fn covers(&self, block_len: usize) -> bool {
        self.zone.covers(block_len)
            && self.rate.covers(block_len)
            && self.micro_rate.covers(block_len)
            && self.micro_rate_freq.covers(block_len)
            && self.skew.covers(block_len)
            && self.repeats.covers(block_len)
            && self.color.covers(block_len)
            && self.halo.covers(block_len)
            && self.mix.covers(block_len)
            && self.hold.covers(block_len)
            && self.flip.covers(block_len)
            && self.ping_pong.covers(block_len)
            && self.swap.covers(block_len)
    }

    /// Resolve the values for sample `index`.
    ///
    /// A control that runs out of values keeps its default; callers that
    /// care check [`covers`](Self::covers) first.
    pub fn frame(&self, index: usize) -> FrameParams {
        let d = FrameParams::default();
        FrameParams {
            zone: self.zone.at(index).unwrap_or(d.zone),
            rate: self.rate.at(index).unwrap_or(d.rate),
            micro_rate: self.micro_rate.at(index).unwrap_or(d.micro_rate),
            micro_rate_freq: self.micro_rate_freq.at(index).unwrap_or(d.micro_rate_freq),
            skew: self.skew.at(index).unwrap_or(d.skew),
            repeats: self.repeats.at(index).unwrap_or(d.repeats),
            color: self.color.at(index).unwrap_or(d.color),
            halo: self.halo.at(index).unwrap_or(d.halo),
            mix: self.mix.at(index).unwrap_or(d.mix),
            hold: self.hold.at(index).unwrap_or(d.hold),
            flip: self.flip.at(index).unwrap_or(d.flip),
            ping_pong: self.ping_pong.at(index).unwrap_or(d.ping_pong),
            swap: self.swap.at(index).unwrap_or(d.swap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parameter_table() {
        let d = FrameParams::default();
        assert_eq!(d.zone, 1.0);
        assert_eq!(d.rate, 0.5);
        assert_eq!(d.micro_rate, 0.0);
        assert_eq!(d.micro_rate_freq, 2.0);
        assert_eq!(d.skew, 0.0);
        assert_eq!(d.repeats, 0.3);
        assert_eq!(d.color, 0.5);
        assert_eq!(d.halo, 0.0);
        assert_eq!(d.mix, 0.5);
        assert!(!d.hold && !d.flip && !d.ping_pong && !d.swap);
    }

    #[test]
    fn test_sanitized_clamps_and_replaces_non_finite() {
        let wild = FrameParams {
            zone: 3.9,
            rate: -1.0,
            micro_rate: f32::NAN,
            micro_rate_freq: 100.0,
            skew: -7.0,
            repeats: f32::INFINITY,
            color: 2.0,
            halo: f32::NEG_INFINITY,
            mix: 1.5,
            hold: true,
            ..FrameParams::default()
        };
        let s = wild.sanitized();

        assert_eq!(s.zone, 3.0);
        assert_eq!(s.rate, 0.0);
        assert_eq!(s.micro_rate, 0.0);
        assert_eq!(s.micro_rate_freq, 8.0);
        assert_eq!(s.skew, -1.0);
        assert_eq!(s.repeats, 0.3);
        assert_eq!(s.color, 1.0);
        assert_eq!(s.halo, 0.0);
        assert_eq!(s.mix, 1.0);
        assert!(s.hold, "toggles pass through untouched");
    }

    #[test]
    fn test_zone_is_floored() {
        let p = FrameParams {
            zone: 1.7,
            ..FrameParams::default()
        };
        assert_eq!(p.sanitized().zone, 1.0);
    }

    #[test]
    fn test_per_sample_and_constant_controls_resolve() {
        let rates = [0.1, 0.2, 0.3];
        let holds = [false, true, false];
        let set = ParameterSet {
            rate: Control::PerSample(&rates),
            hold: Control::PerSample(&holds),
            ..ParameterSet::default()
        };

        assert!(set.covers(3));
        assert!(!set.covers(4));

        let f = set.frame(1);
        assert_eq!(f.rate, 0.2);
        assert!(f.hold);
        assert_eq!(f.mix, 0.5);

        // Past the end of a short array the default is used.
        assert_eq!(set.frame(10).rate, 0.5);
    }

    #[test]
    fn test_with_delay_time() {
        let p = FrameParams::default().with_delay_time(1.2);
        assert_eq!(p.zone, 2.0);
        assert!((p.rate - 0.5).abs() < 1e-6);
    }
}
