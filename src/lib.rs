//! # Loveless Zone Delay: An AU/VST3/CLAP Modulation Delay
//!
//! A stereo delay built around four time zones, from 5 ms combs up to
//! 10 second loops, with a color filter bank, allpass "halo" diffusion and
//! a saturating feedback path. Built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug); one codebase gives
//! Audio Unit (AUv2), VST3 and CLAP builds.
//!
//! The DSP lives in [`dsp`] and has no plugin-format dependencies. This
//! file only adapts it to nih-plug: it turns host parameters into a
//! [`ParameterSet`] per block and runs [`DelayKernel`] in place.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬──────────────────────────────────────────── × (1 - mix) ───┐
//!         │                                                            │
//!         │    ┌────────────────────────────────────────────────┐      │
//!         │    │                 FEEDBACK LOOP                  │      │
//!         │    │                                                │      │
//!         └──►(+)──► [10 s ring] ──► [color] ──► [halo] ──► [sat]─┴─ × mix ─►(+)──► Output
//!              ▲      zone/rate/μRate                           │
//!              │      hold, flip                                │
//!              └──────────────── × repeats × 0.9 ◄──────────────┘
//! ```

pub mod dsp;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::control::{Control, ParameterSet};
use dsp::kernel::DelayKernel;
use nih_plug::prelude::*;
use params::PluginParams;

/// Per-sample values for the smoothed parameters, filled in `process()`
/// while a smoother is ramping.
///
/// One vector per continuous control, each as long as the largest block
/// the host promised in `initialize()`. They are allocated there, on the
/// host's setup thread, because `process()` runs on the audio thread and
/// must not touch the allocator (`assert_process_allocs` checks this in
/// debug builds).
#[derive(Default)]
struct SmoothingScratch {
    rate: Vec<f32>,
    micro_rate: Vec<f32>,
    micro_rate_freq: Vec<f32>,
    skew: Vec<f32>,
    repeats: Vec<f32>,
    color: Vec<f32>,
    halo: Vec<f32>,
    mix: Vec<f32>,
}

impl SmoothingScratch {
    fn with_capacity(max_block: usize) -> Self {
        Self {
            rate: vec![0.0; max_block],
            micro_rate: vec![0.0; max_block],
            micro_rate_freq: vec![0.0; max_block],
            skew: vec![0.0; max_block],
            repeats: vec![0.0; max_block],
            color: vec![0.0; max_block],
            halo: vec![0.0; max_block],
            mix: vec![0.0; max_block],
        }
    }
}

/// Turn one smoothed parameter into a kernel [`Control`].
///
/// - While the smoother is ramping, `next_block` writes this block's
///   values into `scratch` and the kernel reads them sample by sample.
/// - Once it has settled, every sample would get the same value, so a
///   single `Constant` is enough.
///
/// A host that sends a block larger than it promised in `initialize()`
/// gets the current value as a constant rather than a panic.
fn resolve<'a>(param: &FloatParam, scratch: &'a mut [f32], block_len: usize) -> Control<'a, f32> {
    if param.smoothed.is_smoothing() {
        if let Some(values) = scratch.get_mut(..block_len) {
            param.smoothed.next_block(values, block_len);
            return Control::PerSample(values);
        }
    }
    Control::Constant(param.smoothed.next())
}

struct ZoneDelay {
    params: Arc<PluginParams>,

    /// Built in `initialize()` once the sample rate is known. The ring
    /// buffer and the hold snapshot are ten seconds each, so this is the
    /// one big allocation of the plugin.
    kernel: Option<DelayKernel>,

    scratch: SmoothingScratch,

    /// Set for the 1-in/2-out layout: the left input is copied to the
    /// right before processing.
    mono_input: bool,
}

impl Default for ZoneDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            kernel: None,
            scratch: SmoothingScratch::default(),
            mono_input: false,
        }
    }
}

impl Plugin for ZoneDelay {
    const NAME: &'static str = "Loveless Zone Delay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // The effect is stereo throughout; a mono source is spread to both
    // sides so skew, swap and ping-pong still have something to act on.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Hold and flip must switch on the sample the automation asks for;
    // nih-plug splits the block there.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;

        let Some(kernel) = DelayKernel::new(sample_rate) else {
            nih_error!("Cannot build the delay kernel at a sample rate of {sample_rate} Hz");
            return false;
        };

        self.mono_input = audio_io_layout
            .main_input_channels
            .is_some_and(|c| c.get() == 1);

        let max_block = buffer_config.max_buffer_size as usize;
        if max_block == 0 {
            nih_warn!("Host reported a maximum block size of 0; parameter ramps will be stepped");
        }
        self.scratch = SmoothingScratch::with_capacity(max_block);

        nih_log!(
            "Zone delay ready: {} Hz, {} samples of history, {} input",
            kernel.sample_rate(),
            kernel.capacity(),
            if self.mono_input { "mono" } else { "stereo" }
        );
        self.kernel = Some(kernel);

        true
    }

    /// Stop or bypass: drop every echo, the held capture and the filter
    /// memories so nothing stale plays on restart.
    fn reset(&mut self) {
        if let Some(kernel) = &mut self.kernel {
            kernel.reset();
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let Some(kernel) = self.kernel.as_mut() else {
            return ProcessStatus::Normal;
        };

        let block_len = buffer.samples();
        let params = &self.params;

        // ─── Resolve the host parameters for this block ───
        //
        // The kernel takes every control as either one value for the whole
        // block or one value per sample. A knob that is still gliding
        // toward a new value has to reach the kernel as a ramp, otherwise
        // the jump at the block boundary clicks. A knob at rest is passed
        // as a single constant, which saves filling eight arrays of
        // identical numbers on every call.
        //
        // The ramps are written into the scratch vectors sized in
        // `initialize()`, so nothing here allocates.
        let SmoothingScratch {
            rate,
            micro_rate,
            micro_rate_freq,
            skew,
            repeats,
            color,
            halo,
            mix,
        } = &mut self.scratch;

        let controls = ParameterSet {
            // Zone and the toggles are stepped. With sample-accurate
            // automation nih-plug has already split the block at each
            // change, so within this block they are constant.
            zone: Control::Constant(params.zone.value() as f32),
            rate: resolve(&params.rate, rate, block_len),
            micro_rate: resolve(&params.micro_rate, micro_rate, block_len),
            micro_rate_freq: resolve(&params.micro_rate_freq, micro_rate_freq, block_len),
            skew: resolve(&params.skew, skew, block_len),
            repeats: resolve(&params.repeats, repeats, block_len),
            color: resolve(&params.color, color, block_len),
            halo: resolve(&params.halo, halo, block_len),
            mix: resolve(&params.mix, mix, block_len),
            hold: Control::Constant(params.hold.value()),
            flip: Control::Constant(params.flip.value()),
            ping_pong: Control::Constant(params.ping_pong.value()),
            swap: Control::Constant(params.swap.value()),
        };

        // ─── Run the kernel in place ───
        //
        // Both layouts give us two output channels. In the mono layout
        // nih-plug only copies the single input into the left one, so the
        // right is filled from it before the kernel sees the block.
        let [left, right] = buffer.as_slice() else {
            return ProcessStatus::Normal;
        };
        if self.mono_input {
            right.copy_from_slice(left);
        }
        kernel.process_in_place(left, right, &controls);

        // ─── Report the tail ───
        //
        // Tell the host how long the echoes keep ringing, so it keeps
        // calling process() after the input goes silent instead of cutting
        // the repeats off. The estimate uses the settings at the end of
        // the block. While holding, or when the feedback loop is strong
        // enough to sustain itself, the effect never goes quiet on its own
        // and asks to be kept alive.
        let last = controls.frame(block_len.saturating_sub(1));
        match kernel.tail_samples(&last) {
            Some(samples) => ProcessStatus::Tail(samples),
            None => ProcessStatus::KeepAlive,
        }
    }
}

impl ClapPlugin for ZoneDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-zone-delay-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A four-zone modulation delay with color, halo, hold and flip");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
        ClapFeature::Chorus,
        ClapFeature::Flanger,
    ];
}

impl Vst3Plugin for ZoneDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssZoneDly_v01";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Delay,
        Vst3SubCategory::Modulation,
    ];
}

nih_export_clap!(ZoneDelay);
nih_export_vst3!(ZoneDelay);

// AUv2 entry point for Logic Pro, wrapped around the CLAP build.
clap_wrapper::export_auv2!();
