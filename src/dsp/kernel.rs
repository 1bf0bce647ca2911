//! # The Delay Kernel
//!
//! Everything the effect does to one stereo frame, in order:
//!
//! ```text
//!  in ──┬───────────────────────────────────────────────── × (1 − mix) ──┐
//!       │                                                                │
//!       │   delay-time ──► read (live | frozen, fwd | flip)              │
//!       │                       │                                        │
//!       │        ping-pong? ─► swap in the other side's feedback         │
//!       │                       │                                        │
//!       │                 color filters ─► halo ─► saturator ─┬─ × mix ─(+)─► out
//!       │                                                     │
//!       │                                          × min(repeats, 1.1)
//!       │                                                     │
//!       └──────────► (+) ◄──────────── × 0.9 ─────────────────┘
//!                     │
//!              write ring (skipped while holding)
//! ```
//!
//! ## Hold and Flip
//!
//! The two toggles combine into four read modes:
//!
//! | hold | flip | reads from        | direction       |
//! |------|------|-------------------|-----------------|
//! | off  | off  | live ring         | behind cursor   |
//! | off  | on   | live ring         | ahead of cursor |
//! | on   | off  | frozen snapshot   | behind cursor   |
//! | on   | on   | frozen snapshot   | ahead of cursor |
//!
//! Switching hold on copies the live ring into the snapshot once. While
//! holding, nothing is written and the cursor stands still, so frozen
//! reads stay at the same distance from the paused cursor. Only the delay
//! time (rate, μRate, skew) moves the read head through the capture.
//! Switching hold off resumes writing where the cursor stopped.

use std::num::NonZeroUsize;

use super::control::{FrameParams, ParameterSet};
use super::delay_time::DelayTimeController;
use super::filter::{color_peak_gain, ToneColorFilter};
use super::halo::HaloDiffuser;
use super::ring_buffer::{Channel, Direction, RingBuffer};
use super::saturator::Saturator;

/// Seconds of history kept per channel.
pub const MAX_DELAY_SECONDS: f64 = 10.0;

/// Upper bound on the feedback gain before saturation.
pub const MAX_FEEDBACK_GAIN: f32 = 1.1;

/// Scale applied to the feedback when it is written back into the ring.
pub const FEEDBACK_WRITE_SCALE: f32 = 0.9;

/// Where the buffer reader fetches from this sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    LiveForward,
    LiveReverse,
    FrozenForward,
    FrozenReverse,
}

impl ReadMode {
    pub fn new(hold: bool, flip: bool) -> Self {
        match (hold, flip) {
            (false, false) => Self::LiveForward,
            (false, true) => Self::LiveReverse,
            (true, false) => Self::FrozenForward,
            (true, true) => Self::FrozenReverse,
        }
    }

    pub fn is_frozen(self) -> bool {
        matches!(self, Self::FrozenForward | Self::FrozenReverse)
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::LiveForward | Self::FrozenForward => Direction::Forward,
            Self::LiveReverse | Self::FrozenReverse => Direction::Reverse,
        }
    }
}

/// What happened to a block handed to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The block ran through the effect.
    Processed,
    /// The block was empty or inconsistent; the output (if any) was filled
    /// with silence and no state changed.
    Silenced,
}

/// Input side of a block: two channels, or one duplicated to both.
#[derive(Debug, Clone, Copy)]
pub enum BlockInput<'a> {
    Stereo(&'a [f32], &'a [f32]),
    Mono(&'a [f32]),
}

impl BlockInput<'_> {
    fn channels(&self) -> (&[f32], &[f32]) {
        match *self {
            BlockInput::Stereo(left, right) => (left, right),
            BlockInput::Mono(mono) => (mono, mono),
        }
    }
}

/// Swap in the opposite channel's previous feedback when ping-pong is on.
#[inline]
pub fn crossfeed(delayed: (f32, f32), previous_feedback: (f32, f32), ping_pong: bool) -> (f32, f32) {
    if ping_pong {
        (previous_feedback.1, previous_feedback.0)
    } else {
        delayed
    }
}

/// Treat NaN and infinite input as silence so it can't poison the ring.
#[inline]
fn finite_or_silent(sample: f32) -> f32 {
    if sample.is_finite() {
        sample
    } else {
        0.0
    }
}

/// The complete per-instance state of the effect.
///
/// Everything is allocated in [`DelayKernel::new`]. None of the processing
/// methods allocate, lock or panic, so they are safe to call from a
/// real-time audio thread.
#[derive(Debug, Clone)]
pub struct DelayKernel {
    sample_rate: f32,
    live: RingBuffer,
    snapshot: RingBuffer,
    hold_active: bool,
    delay_time: DelayTimeController,
    tone: ToneColorFilter,
    halo: [HaloDiffuser; 2],
    /// Last `(left, right)` feedback sample.
    feedback: (f32, f32),
}

impl DelayKernel {
    /// Build a kernel for `sample_rate`, sizing the ring for ten seconds.
    ///
    /// Returns `None` if the sample rate is not a finite positive number.
    pub fn new(sample_rate: f32) -> Option<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return None;
        }
        let capacity = (f64::from(sample_rate) * MAX_DELAY_SECONDS).ceil() as usize;
        let capacity = NonZeroUsize::new(capacity)?;

        Some(Self {
            sample_rate,
            live: RingBuffer::new(capacity),
            snapshot: RingBuffer::new(capacity),
            hold_active: false,
            delay_time: DelayTimeController::new(sample_rate),
            tone: ToneColorFilter::new(sample_rate),
            halo: [HaloDiffuser::new(sample_rate), HaloDiffuser::new(sample_rate)],
            feedback: (0.0, 0.0),
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Ring capacity in samples per channel.
    pub fn capacity(&self) -> usize {
        self.live.capacity()
    }

    pub fn is_holding(&self) -> bool {
        self.hold_active
    }

    /// Last `(left, right)` feedback sample.
    pub fn feedback(&self) -> (f32, f32) {
        self.feedback
    }

    /// The live ring's write cursor.
    pub fn write_pos(&self) -> usize {
        self.live.write_pos()
    }

    /// Process one stereo frame.
    pub fn process_frame(&mut self, input_l: f32, input_r: f32, params: &FrameParams) -> (f32, f32) {
        let p = params.sanitized();
        let input_l = finite_or_silent(input_l);
        let input_r = finite_or_silent(input_r);

        // Hold is level-triggered: only the off→on edge copies.
        if p.hold && !self.hold_active {
            self.snapshot.copy_from(&self.live);
            self.hold_active = true;
        } else if !p.hold && self.hold_active {
            self.hold_active = false;
        }

        let (delay_l, delay_r) = self.delay_time.next(&p);

        let mode = ReadMode::new(self.hold_active, p.flip);
        let source = if mode.is_frozen() {
            &self.snapshot
        } else {
            &self.live
        };
        let delayed = (
            source.read(Channel::Left, delay_l, mode.direction()),
            source.read(Channel::Right, delay_r, mode.direction()),
        );
        let (delayed_l, delayed_r) = crossfeed(delayed, self.feedback, p.ping_pong);

        self.tone.set_color(p.color);
        let (colored_l, colored_r) = self.tone.process(delayed_l, delayed_r);

        let [halo_l, halo_r] = &mut self.halo;
        let haloed_l = halo_l.process(colored_l, p.halo);
        let haloed_r = halo_r.process(colored_r, p.halo);

        let saturator = Saturator::for_color(p.color);
        let wet_l = saturator.process(haloed_l);
        let wet_r = saturator.process(haloed_r);

        let gain = p.repeats.min(MAX_FEEDBACK_GAIN);
        self.feedback = (wet_l * gain, wet_r * gain);

        if !self.hold_active {
            self.live.write(
                input_l + self.feedback.0 * FEEDBACK_WRITE_SCALE,
                input_r + self.feedback.1 * FEEDBACK_WRITE_SCALE,
            );
            self.live.advance();
        }

        (
            input_l * (1.0 - p.mix) + wet_l * p.mix,
            input_r * (1.0 - p.mix) + wet_r * p.mix,
        )
    }

    /// Process a block from separate input and output buffers.
    ///
    /// All four slices must have the same, non-zero length and every
    /// per-sample control must cover it. Otherwise the outputs are
    /// silenced and the kernel state is left alone.
    pub fn process_block(
        &mut self,
        input: BlockInput<'_>,
        out_l: &mut [f32],
        out_r: &mut [f32],
        params: &ParameterSet<'_>,
    ) -> BlockOutcome {
        let (in_l, in_r) = input.channels();
        let len = out_l.len();

        if len == 0
            || out_r.len() != len
            || in_l.len() != len
            || in_r.len() != len
            || !params.covers(len)
        {
            out_l.fill(0.0);
            out_r.fill(0.0);
            return BlockOutcome::Silenced;
        }

        for i in 0..len {
            let (l, r) = self.process_frame(in_l[i], in_r[i], &params.frame(i));
            out_l[i] = l;
            out_r[i] = r;
        }
        BlockOutcome::Processed
    }

    /// Process a stereo block in place, the layout plugin hosts hand out.
    pub fn process_in_place(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        params: &ParameterSet<'_>,
    ) -> BlockOutcome {
        let len = left.len();
        if len == 0 || right.len() != len || !params.covers(len) {
            left.fill(0.0);
            right.fill(0.0);
            return BlockOutcome::Silenced;
        }

        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            (*l, *r) = self.process_frame(*l, *r, &params.frame(i));
        }
        BlockOutcome::Processed
    }

    /// How many samples the effect keeps sounding after the input stops,
    /// or `None` if it never stops on its own (holding, or a loop that can
    /// sustain itself).
    ///
    /// One pass round the loop multiplies the signal by at most
    ///
    /// ```text
    /// g = min(repeats, 1.1) · 0.9 · color peak gain · saturator slope
    /// ```
    ///
    /// (ping-pong feeds back without the 0.9 write scale). With `g ≥ 1` the
    /// repeats never die out. Otherwise reaching −60 dB takes
    /// `log(0.001) / log(g)` passes of the longest current delay, plus the
    /// halo's ring-out.
    pub fn tail_samples(&self, params: &FrameParams) -> Option<u32> {
        let p = params.sanitized();
        if self.hold_active || p.hold {
            return None;
        }
        let delay = self.delay_time.longest_samples();
        let halo = self.halo[0].longest_stage() as f32 * 4.0;

        let write_scale = if p.ping_pong { 1.0 } else { FEEDBACK_WRITE_SCALE };
        let loop_gain = p.repeats.min(MAX_FEEDBACK_GAIN)
            * write_scale
            * color_peak_gain(p.color, self.sample_rate)
            * Saturator::for_color(p.color).max_slope();
        if loop_gain >= 1.0 {
            return None;
        }
        let passes = if loop_gain > 0.001 {
            // log10(0.001) = -3
            -3.0 / loop_gain.log10()
        } else {
            1.0
        };
        Some((passes.max(1.0) * delay + halo).min(u32::MAX as f32) as u32)
    }

    /// Silence every buffer and filter and leave hold mode.
    pub fn reset(&mut self) {
        self.live.clear();
        self.snapshot.clear();
        self.hold_active = false;
        self.delay_time.reset();
        self.tone.reset();
        for halo in &mut self.halo {
            halo.reset();
        }
        self.feedback = (0.0, 0.0);
    }
}
