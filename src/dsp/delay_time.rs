//! # Delay-Time Controller
//!
//! Turns the zone/rate/μRate/skew/swap controls into one delay length per
//! channel, smoothed per sample so the read heads glide instead of jumping.
//!
//! ```text
//! zone ─► [5–50 ms | 50–400 ms | 0.4–2 s | 2–10 s]
//! rate ─► base = min + rate · (max − min)
//!
//!            ┌── sin(lfo) · μRate · 15 ms ──┐
//!            ▼                              ▼
//! L = base − skew·base/2 + μ     R = base + skew·base/2 + μ
//!            │                              │
//!            └─────────── swap? ────────────┘
//!                           │
//!                 one-pole smoother (0.999)
//!                           │
//!                    max(1 ms) · sample rate
//! ```

use std::f32::consts::TAU;

use super::control::FrameParams;

/// Per-sample smoothing coefficient for the delay length.
///
/// `smoothed = smoothed · c + target · (1 − c)`; at 48 kHz this is a time
/// constant of about 21 ms.
pub const SMOOTHING_COEFFICIENT: f32 = 0.999;

/// Peak μRate excursion in seconds (±15 ms at full depth).
pub const MICRO_RATE_DEPTH_SECONDS: f32 = 0.015;

/// Shortest delay the read heads are ever allowed to sit at.
pub const MIN_DELAY_SECONDS: f32 = 0.001;

/// Where both smoothers start before the first target arrives.
const INITIAL_DELAY_SECONDS: f32 = 0.1;

/// One of the four delay-time ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// 5–50 ms: comb filtering, flanging, Karplus-Strong plucks.
    A,
    /// 50–400 ms: slapback and chorus-ish doubling.
    B,
    /// 400 ms–2 s: classic echoes.
    C,
    /// 2–10 s: loops and long ambient repeats.
    D,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::A, Zone::B, Zone::C, Zone::D];

    /// Floors a continuous zone control and clamps it to `A..=D`.
    /// Non-finite values select the default zone (B).
    pub fn from_control(zone: f32) -> Self {
        if !zone.is_finite() {
            return Zone::B;
        }
        match zone.floor() {
            z if z <= 0.0 => Zone::A,
            z if z < 2.0 => Zone::B,
            z if z < 3.0 => Zone::C,
            _ => Zone::D,
        }
    }

    /// Same as [`from_control`](Self::from_control) for an integer index.
    pub fn from_index(index: i32) -> Self {
        Self::from_control(index as f32)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// `(min, max)` of the zone in seconds.
    pub fn range_seconds(self) -> (f32, f32) {
        match self {
            Zone::A => (0.005, 0.050),
            Zone::B => (0.050, 0.400),
            Zone::C => (0.400, 2.000),
            Zone::D => (2.000, 10.000),
        }
    }

    /// Base delay in seconds for a rate within this zone. Rate is clamped
    /// to `[0, 1]`; a non-finite rate sits in the middle of the zone.
    pub fn delay_seconds(self, rate: f32) -> f32 {
        let rate = if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let (min, max) = self.range_seconds();
        min + rate * (max - min)
    }

    /// Inverse of [`delay_seconds`](Self::delay_seconds): pick the zone an
    /// absolute delay time belongs to and the rate that lands on it.
    ///
    /// Times outside 5 ms–10 s end up at the nearest edge.
    pub fn locate(seconds: f32) -> (Zone, f32) {
        let zone = match seconds {
            s if s < 0.050 => Zone::A,
            s if s < 0.400 => Zone::B,
            s if s < 2.000 => Zone::C,
            _ => Zone::D,
        };
        let (min, max) = zone.range_seconds();
        let rate = ((seconds - min) / (max - min)).clamp(0.0, 1.0);
        (zone, rate)
    }

    /// Short label for the host's parameter display.
    pub fn label(self) -> &'static str {
        match self {
            Zone::A => "A (5-50 ms)",
            Zone::B => "B (50-400 ms)",
            Zone::C => "C (0.4-2 s)",
            Zone::D => "D (2-10 s)",
        }
    }
}

/// Smoothed left/right delay lengths plus the shared μRate LFO.
#[derive(Debug, Clone)]
pub struct DelayTimeController {
    sample_rate: f32,
    lfo_phase: f32,
    // f64 so the smoother can settle all the way onto long targets; in f32
    // the last few microseconds of the glide round away.
    smoothed: [f64; 2],
    target: [f64; 2],
}

impl DelayTimeController {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            lfo_phase: 0.0,
            smoothed: [f64::from(INITIAL_DELAY_SECONDS); 2],
            target: [f64::from(INITIAL_DELAY_SECONDS); 2],
        }
    }

    /// Advance one sample and return `(left, right)` delay in samples.
    ///
    /// Expects sanitized parameters (see [`FrameParams::sanitized`]), but
    /// still clamps zone and rate itself.
    pub fn next(&mut self, params: &FrameParams) -> (f32, f32) {
        let base = Zone::from_control(params.zone).delay_seconds(params.rate);

        // A single step can exceed a full cycle at very low sample rates.
        self.lfo_phase = (self.lfo_phase + TAU * params.micro_rate_freq / self.sample_rate).rem_euclid(TAU);
        let micro_offset = self.lfo_phase.sin() * params.micro_rate * MICRO_RATE_DEPTH_SECONDS;

        let skew_amount = params.skew * base * 0.5;
        let mut target = [
            f64::from(base - skew_amount + micro_offset),
            f64::from(base + skew_amount + micro_offset),
        ];
        if params.swap {
            target.swap(0, 1);
        }
        self.target = target;

        let c = f64::from(SMOOTHING_COEFFICIENT);
        for (smoothed, target) in self.smoothed.iter_mut().zip(target) {
            *smoothed = *smoothed * c + target * (1.0 - c);
        }

        (self.samples(0), self.samples(1))
    }

    /// Smoothed delay in seconds, `[left, right]`, before the 1 ms floor.
    pub fn smoothed_seconds(&self) -> [f32; 2] {
        self.smoothed.map(|s| s as f32)
    }

    /// Most recent per-channel target in seconds.
    pub fn target_seconds(&self) -> [f32; 2] {
        self.target.map(|t| t as f32)
    }

    /// Longest of the two current delays, in samples.
    pub fn longest_samples(&self) -> f32 {
        self.samples(0).max(self.samples(1))
    }

    pub fn reset(&mut self) {
        self.lfo_phase = 0.0;
        self.smoothed = [f64::from(INITIAL_DELAY_SECONDS); 2];
        self.target = [f64::from(INITIAL_DELAY_SECONDS); 2];
    }

    fn samples(&self, channel: usize) -> f32 {
        (self.smoothed[channel].max(f64::from(MIN_DELAY_SECONDS)) * f64::from(self.sample_rate))
            as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(zone: f32, rate: f32) -> FrameParams {
        FrameParams {
            zone,
            rate,
            ..FrameParams::default()
        }
    }

    #[test]
    fn test_zone_floor_and_clamp() {
        assert_eq!(Zone::from_control(-2.0), Zone::A);
        assert_eq!(Zone::from_control(0.99), Zone::A);
        assert_eq!(Zone::from_control(1.0), Zone::B);
        assert_eq!(Zone::from_control(2.7), Zone::C);
        assert_eq!(Zone::from_control(3.0), Zone::D);
        assert_eq!(Zone::from_control(17.0), Zone::D);
        assert_eq!(Zone::from_control(f32::NAN), Zone::B);
    }

    #[test]
    fn test_base_delay_within_zone() {
        assert!((Zone::B.delay_seconds(0.5) - 0.225).abs() < 1e-6);
        assert!((Zone::A.delay_seconds(0.0) - 0.005).abs() < 1e-6);
        assert!((Zone::D.delay_seconds(1.0) - 10.0).abs() < 1e-6);
        // Rate is clamped even if the caller didn't.
        assert!((Zone::C.delay_seconds(4.0) - 2.0).abs() < 1e-6);
        assert!((Zone::C.delay_seconds(-1.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_locate_inverts_delay_seconds() {
        for zone in Zone::ALL {
            for rate in [0.1, 0.5, 0.9] {
                let seconds = zone.delay_seconds(rate);
                let (found, found_rate) = Zone::locate(seconds);
                assert_eq!(found, zone, "{seconds}s");
                assert!((found_rate - rate).abs() < 1e-4, "{seconds}s → {found_rate}");
            }
        }

        assert_eq!(Zone::locate(0.001), (Zone::A, 0.0));
        assert_eq!(Zone::locate(60.0), (Zone::D, 1.0));
    }

    /// The smoother moves toward a fixed target without ever passing it.
    #[test]
    fn test_smoothing_converges_monotonically() {
        let mut ctl = DelayTimeController::new(48_000.0);
        let p = params(1.0, 0.5); // 225 ms, above the 100 ms start point

        let mut previous = ctl.smoothed_seconds()[0];
        for _ in 0..20_000 {
            ctl.next(&p);
            let now = ctl.smoothed_seconds()[0];
            assert!(now >= previous - 1e-7, "smoother went backwards: {previous} → {now}");
            assert!(now <= 0.225 + 1e-6, "smoother overshot: {now}");
            previous = now;
        }
        assert!((previous - 0.225).abs() < 1e-5, "did not converge: {previous}");

        // And from above.
        let p = params(0.0, 0.5);
        for _ in 0..20_000 {
            ctl.next(&p);
            let now = ctl.smoothed_seconds()[0];
            assert!(now <= previous + 1e-7);
            assert!(now >= 0.0275 - 1e-6);
            previous = now;
        }
    }

    #[test]
    fn test_skew_and_swap() {
        let mut p = params(1.0, 0.5);
        p.skew = 1.0;

        let mut ctl = DelayTimeController::new(48_000.0);
        ctl.next(&p);
        let [l, r] = ctl.target_seconds();
        assert!((l - 0.1125).abs() < 1e-6, "left target {l}");
        assert!((r - 0.3375).abs() < 1e-6, "right target {r}");

        p.swap = true;
        ctl.next(&p);
        let [l, r] = ctl.target_seconds();
        assert!((l - 0.3375).abs() < 1e-6, "swapped left target {l}");
        assert!((r - 0.1125).abs() < 1e-6, "swapped right target {r}");
    }

    #[test]
    fn test_micro_rate_depth_is_bounded() {
        let mut p = params(2.0, 0.0); // 400 ms
        p.micro_rate = 1.0;
        p.micro_rate_freq = 8.0;

        let mut ctl = DelayTimeController::new(48_000.0);
        let (mut lo, mut hi) = (f32::MAX, f32::MIN);
        for _ in 0..48_000 {
            ctl.next(&p);
            let [l, _] = ctl.target_seconds();
            lo = lo.min(l);
            hi = hi.max(l);
        }
        assert!(lo >= 0.4 - MICRO_RATE_DEPTH_SECONDS - 1e-5, "min {lo}");
        assert!(hi <= 0.4 + MICRO_RATE_DEPTH_SECONDS + 1e-5, "max {hi}");
        assert!(hi - lo > 0.029, "LFO never swung: {lo}..{hi}");
    }

    /// Zone A at rate 0 with full skew and μRate can ask for a negative
    /// delay on one side. The read head still stays at least 1 ms back.
    #[test]
    fn test_delay_floor_of_one_millisecond() {
        let mut p = params(0.0, 0.0);
        p.skew = 1.0;
        p.micro_rate = 1.0;
        p.micro_rate_freq = 8.0;

        let mut ctl = DelayTimeController::new(48_000.0);
        for _ in 0..96_000 {
            let (l, r) = ctl.next(&p);
            assert!(l >= 48.0 - 1e-3, "left {l} samples");
            assert!(r >= 48.0 - 1e-3, "right {r} samples");
        }
    }

    #[test]
    fn test_lfo_phase_stays_wrapped_at_low_sample_rates() {
        let mut ctl = DelayTimeController::new(2.0);
        let p = FrameParams {
            micro_rate: 1.0,
            micro_rate_freq: 8.0,
            ..FrameParams::default()
        };
        for _ in 0..1000 {
            ctl.next(&p);
            assert!(
                (0.0..TAU).contains(&ctl.lfo_phase),
                "phase escaped its cycle: {}",
                ctl.lfo_phase
            );
        }
    }
}
