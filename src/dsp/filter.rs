//! # Biquad Filters and the Color Bank
//!
//! The repeats are shaped by two biquads in series per channel. A biquad
//! is a second-order IIR filter:
//!
//! ```text
//! y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] − a1·y[n-1] − a2·y[n-2]
//! ```
//!
//! Two poles and two zeros are enough for lowpass, bandpass, shelf, peak
//! and allpass responses; only the five coefficients change. They come
//! from the well-known RBJ "Audio EQ Cookbook" formulas, all normalised so
//! that `a0 = 1`.
//!
//! ## Color Regions
//!
//! The single color knob sweeps through five characters:
//!
//! ```text
//!  0.0      0.2      0.4      0.6      0.8      1.0
//!   │  dark  │  bbd   │  tape  │ bright │ crisp  │
//!   │ LP→LP  │ LP→BP  │ HS↓→LP │ HS↑→AP │ HS↑→PK │
//! ```
//!
//! Within a region the knob position `t` (0..1) slides the cutoff or shelf
//! gain, so the sweep is continuous inside each region and steps at the
//! boundaries.

use std::f32::consts::PI;

/// Normalised biquad coefficients (`a0` already divided out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

/// Shared `w0`, `cos(w0)` and `alpha` terms of the cookbook designs.
struct Design {
    cos_w0: f32,
    alpha: f32,
}

impl Design {
    fn new(freq: f32, q: f32, sample_rate: f32) -> Self {
        // Above ~Nyquist the cookbook formulas fold back and the filter can
        // go unstable, so keep the design frequency in the audible band.
        let freq = freq.clamp(10.0, sample_rate * 0.49);
        let w0 = 2.0 * PI * freq / sample_rate;
        Self {
            cos_w0: w0.cos(),
            alpha: w0.sin() / (2.0 * q),
        }
    }
}

impl BiquadCoefficients {
    /// Pass-through: `y[n] = x[n]`.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Magnitude of the frequency response at `freq`, from
    /// `H(e^jw) = (b0 + b1·e^-jw + b2·e^-2jw) / (1 + a1·e^-jw + a2·e^-2jw)`.
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * freq / sample_rate;
        let (sin1, cos1) = w.sin_cos();
        let (sin2, cos2) = (2.0 * w).sin_cos();

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// 12 dB/oct lowpass.
    pub fn lowpass(freq: f32, q: f32, sample_rate: f32) -> Self {
        let d = Design::new(freq, q, sample_rate);
        let b1 = 1.0 - d.cos_w0;
        Self::normalized(
            b1 / 2.0,
            b1,
            b1 / 2.0,
            1.0 + d.alpha,
            -2.0 * d.cos_w0,
            1.0 - d.alpha,
        )
    }

    /// Constant 0 dB peak-gain bandpass.
    pub fn bandpass(freq: f32, q: f32, sample_rate: f32) -> Self {
        let d = Design::new(freq, q, sample_rate);
        Self::normalized(
            d.alpha,
            0.0,
            -d.alpha,
            1.0 + d.alpha,
            -2.0 * d.cos_w0,
            1.0 - d.alpha,
        )
    }

    /// High shelf; `gain_db` above `freq`, unity below.
    pub fn high_shelf(freq: f32, gain_db: f32, q: f32, sample_rate: f32) -> Self {
        let a = 10.0_f32.powf(gain_db / 40.0);
        let d = Design::new(freq, q, sample_rate);
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * d.alpha;

        Self::normalized(
            a * ((a + 1.0) + (a - 1.0) * d.cos_w0 + two_sqrt_a_alpha),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * d.cos_w0),
            a * ((a + 1.0) + (a - 1.0) * d.cos_w0 - two_sqrt_a_alpha),
            (a + 1.0) - (a - 1.0) * d.cos_w0 + two_sqrt_a_alpha,
            2.0 * ((a - 1.0) - (a + 1.0) * d.cos_w0),
            (a + 1.0) - (a - 1.0) * d.cos_w0 - two_sqrt_a_alpha,
        )
    }

    /// Peaking EQ bell.
    pub fn peaking(freq: f32, gain_db: f32, q: f32, sample_rate: f32) -> Self {
        let a = 10.0_f32.powf(gain_db / 40.0);
        let d = Design::new(freq, q, sample_rate);
        Self::normalized(
            1.0 + d.alpha * a,
            -2.0 * d.cos_w0,
            1.0 - d.alpha * a,
            1.0 + d.alpha / a,
            -2.0 * d.cos_w0,
            1.0 - d.alpha / a,
        )
    }

    /// Second-order allpass centred on `freq` (Q of 1). A frequency of zero
    /// gives [`IDENTITY`](Self::IDENTITY).
    pub fn allpass(freq: f32, sample_rate: f32) -> Self {
        if freq <= 0.0 {
            return Self::IDENTITY;
        }
        let d = Design::new(freq, 1.0, sample_rate);
        Self::normalized(
            1.0 - d.alpha,
            -2.0 * d.cos_w0,
            1.0 + d.alpha,
            1.0 + d.alpha,
            -2.0 * d.cos_w0,
            1.0 - d.alpha,
        )
    }
}

/// One biquad's two-sample input and output history.
#[derive(Debug, Clone, Copy, Default)]
pub struct Biquad {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn process(&mut self, input: f32, c: &BiquadCoefficients) -> f32 {
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The five characters the color knob moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRegion {
    Dark,
    Bbd,
    Tape,
    Bright,
    Crisp,
}

impl ColorRegion {
    /// Region for a color value plus the position `t` (0..1) inside it.
    pub fn locate(color: f32) -> (Self, f32) {
        let color = if color.is_finite() {
            color.clamp(0.0, 1.0)
        } else {
            0.5
        };
        match color {
            c if c < 0.2 => (Self::Dark, c / 0.2),
            c if c < 0.4 => (Self::Bbd, (c - 0.2) / 0.2),
            c if c < 0.6 => (Self::Tape, (c - 0.4) / 0.2),
            c if c < 0.8 => (Self::Bright, (c - 0.6) / 0.2),
            c => (Self::Crisp, (c - 0.8) / 0.2),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Bbd => "bbd",
            Self::Tape => "tape",
            Self::Bright => "bright",
            Self::Crisp => "crisp",
        }
    }
}

/// Coefficients of both stages for a given color.
pub fn color_coefficients(
    color: f32,
    sample_rate: f32,
) -> (BiquadCoefficients, BiquadCoefficients) {
    let (region, t) = ColorRegion::locate(color);
    match region {
        ColorRegion::Dark => {
            // Dark spans 4 kHz..11 kHz across its width.
            let freq = 4000.0 + t * 7000.0;
            (
                BiquadCoefficients::lowpass(freq, 0.707, sample_rate),
                BiquadCoefficients::lowpass(freq * 0.5, 0.707, sample_rate),
            )
        }
        ColorRegion::Bbd => (
            BiquadCoefficients::lowpass(4000.0 + t * 6000.0, 1.5, sample_rate),
            BiquadCoefficients::bandpass(2000.0, 2.0, sample_rate),
        ),
        ColorRegion::Tape => (
            BiquadCoefficients::high_shelf(8000.0 - t * 2000.0, -3.0, 0.707, sample_rate),
            BiquadCoefficients::lowpass(12_000.0, 0.707, sample_rate),
        ),
        ColorRegion::Bright => (
            BiquadCoefficients::high_shelf(8000.0, t * 2.0, 0.707, sample_rate),
            BiquadCoefficients::allpass(0.0, sample_rate),
        ),
        ColorRegion::Crisp => (
            BiquadCoefficients::high_shelf(6000.0, 3.0 + t * 2.0, 0.707, sample_rate),
            BiquadCoefficients::peaking(3000.0, 2.0, 1.5, sample_rate),
        ),
    }
}

/// Points scanned by [`color_peak_gain`], log-spaced from 10 Hz to just
/// below Nyquist.
const PEAK_SCAN_POINTS: usize = 256;

/// Largest gain the two color stages apply at any frequency.
///
/// Used to tell whether the feedback loop can sustain itself. Allocation
/// free, but it evaluates a few hundred frequencies, so call it once per
/// block rather than per sample.
pub fn color_peak_gain(color: f32, sample_rate: f32) -> f32 {
    let (stage1, stage2) = color_coefficients(color, sample_rate);
    let low = 10.0_f32;
    let high = sample_rate * 0.49;
    let ratio = (high / low).max(1.0);

    (0..PEAK_SCAN_POINTS)
        .map(|i| {
            let freq = low * ratio.powf(i as f32 / (PEAK_SCAN_POINTS - 1) as f32);
            stage1.magnitude_at(freq, sample_rate) * stage2.magnitude_at(freq, sample_rate)
        })
        .fold(0.0, f32::max)
}

/// Two cascaded biquads per channel, driven by the color control.
///
/// Both channels always share one color, so the coefficients are computed
/// once and cached until the color value changes.
#[derive(Debug, Clone)]
pub struct ToneColorFilter {
    sample_rate: f32,
    cached_color: Option<f32>,
    stage1: BiquadCoefficients,
    stage2: BiquadCoefficients,
    /// `[left, right]` state for each stage.
    state1: [Biquad; 2],
    state2: [Biquad; 2],
}

impl ToneColorFilter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            cached_color: None,
            stage1: BiquadCoefficients::IDENTITY,
            stage2: BiquadCoefficients::IDENTITY,
            state1: [Biquad::default(); 2],
            state2: [Biquad::default(); 2],
        }
    }

    /// Recompute coefficients if `color` differs from the cached value.
    pub fn set_color(&mut self, color: f32) {
        if self.cached_color == Some(color) {
            return;
        }
        let (stage1, stage2) = color_coefficients(color, self.sample_rate);
        self.stage1 = stage1;
        self.stage2 = stage2;
        // NaN never compares equal; storing it would recompute every sample.
        self.cached_color = color.is_finite().then_some(color);
    }

    pub fn coefficients(&self) -> (BiquadCoefficients, BiquadCoefficients) {
        (self.stage1, self.stage2)
    }

    /// Run one stereo frame through both stages.
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let [l1, r1] = &mut self.state1;
        let [l2, r2] = &mut self.state2;
        let left = l2.process(l1.process(left, &self.stage1), &self.stage2);
        let right = r2.process(r1.process(right, &self.stage1), &self.stage2);
        (left, right)
    }

    pub fn reset(&mut self) {
        for biquad in self.state1.iter_mut().chain(self.state2.iter_mut()) {
            biquad.reset();
        }
    }
}
