//! # Halo Diffusion
//!
//! Four Schroeder allpass filters in series smear each repeat into a soft
//! cloud. An allpass passes every frequency at unit gain but scatters the
//! phase, so a click comes out as a short dense burst.
//!
//! ```text
//!           ┌──────────── −g ────────────┐
//!           │                            ▼
//! x ──►(+)──┴──► [z^-L] ────────────────(+)──► y
//!       ▲                    │
//!       └────── g ◄──────────┘   (on y)
//! ```
//!
//! Per stage: `delayed = buf[i]; y = −g·x + delayed; buf[i] = x + g·y`.
//! Stage lengths are ≈10.7, 16, 21.3 and 8 ms. The wet result is blended
//! 70/30 with the input of the network.

const REFERENCE_SAMPLE_RATE: f32 = 48_000.0;

/// Stage lengths in samples at 48 kHz.
const STAGE_LENGTHS: [usize; 4] = [512, 768, 1024, 384];

/// Stage feedback at full halo.
const STAGE_GAINS: [f32; 4] = [0.5, 0.45, 0.4, 0.35];

/// Below this amount the network is skipped entirely.
pub const BYPASS_THRESHOLD: f32 = 0.001;

const WET: f32 = 0.7;
const DRY: f32 = 0.3;

#[derive(Debug, Clone)]
struct AllpassStage {
    buffer: Vec<f32>,
    index: usize,
    base_gain: f32,
}

impl AllpassStage {
    fn new(length: usize, base_gain: f32) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            index: 0,
            base_gain,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, amount: f32) -> f32 {
        let g = self.base_gain * amount;
        let delayed = self.buffer[self.index];
        let output = -g * input + delayed;
        self.buffer[self.index] = input + g * output;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// One channel's four-stage cascade.
#[derive(Debug, Clone)]
pub struct HaloDiffuser {
    stages: [AllpassStage; 4],
}

impl HaloDiffuser {
    /// Stage lengths keep their 48 kHz durations at other sample rates.
    pub fn new(sample_rate: f32) -> Self {
        let scale = sample_rate / REFERENCE_SAMPLE_RATE;
        let stage = |i: usize| {
            let length = (STAGE_LENGTHS[i] as f32 * scale).round() as usize;
            AllpassStage::new(length, STAGE_GAINS[i])
        };
        Self {
            stages: [stage(0), stage(1), stage(2), stage(3)],
        }
    }

    /// Diffuse one sample. `amount` is the halo control (0..1).
    pub fn process(&mut self, input: f32, amount: f32) -> f32 {
        if amount < BYPASS_THRESHOLD {
            return input;
        }
        let diffused = self
            .stages
            .iter_mut()
            .fold(input, |signal, stage| stage.process(signal, amount));
        diffused * WET + input * DRY
    }

    pub fn stage_lengths(&self) -> [usize; 4] {
        [0, 1, 2, 3].map(|i| self.stages[i].buffer.len())
    }

    /// Longest stage, a rough bound on how long the smear rings.
    pub fn longest_stage(&self) -> usize {
        self.stage_lengths().into_iter().max().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}
