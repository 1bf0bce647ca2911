//! # Plugin Parameters
//!
//! The thirteen controls as the host sees them. IDs are short and stable:
//! once a session has been saved with them, renaming one loses that
//! control's value on reload.
//!
//! Continuous controls get a linear smoother so that knob moves and
//! automation reach the kernel as per-sample ramps. Zone and the four
//! toggles are stepped and switch on the exact sample the host asks for.
//! The kernel glides the delay length on its own, so the rate ramp here
//! only has to remove zipper noise.

use std::sync::Arc;

use nih_plug::prelude::*;

use crate::dsp::delay_time::Zone;
use crate::dsp::filter::ColorRegion;

#[derive(Params)]
pub struct PluginParams {
    /// **Zone**: which delay range the rate knob sweeps.
    ///
    /// A = 5-50 ms (flange, comb, Karplus), B = 50-400 ms (chorus, slap),
    /// C = 0.4-2 s (echo), D = 2-10 s (loops).
    #[id = "zone"]
    pub zone: IntParam,

    /// **Rate**: position inside the zone's range.
    #[id = "rate"]
    pub rate: FloatParam,

    /// **μRate**: depth of the shared LFO on the delay time, up to ±15 ms.
    #[id = "urate"]
    pub micro_rate: FloatParam,

    /// **μRate Freq**: speed of that LFO.
    #[id = "ufreq"]
    pub micro_rate_freq: FloatParam,

    /// **Skew**: pushes left and right delays apart in opposite directions.
    #[id = "skew"]
    pub skew: FloatParam,

    /// **Repeats**: feedback. Above 100% the saturator is what keeps the
    /// loop from running away.
    #[id = "rpts"]
    pub repeats: FloatParam,

    /// **Color**: dark → bbd → tape → bright → crisp.
    #[id = "color"]
    pub color: FloatParam,

    /// **Halo**: allpass diffusion on the repeats.
    #[id = "halo"]
    pub halo: FloatParam,

    #[id = "mix"]
    pub mix: FloatParam,

    /// **Hold**: freeze the buffer; reads stay pinned to the paused cursor.
    #[id = "hold"]
    pub hold: BoolParam,

    /// **Flip**: read ahead of the write cursor instead of behind it.
    #[id = "flip"]
    pub flip: BoolParam,

    #[id = "pong"]
    pub ping_pong: BoolParam,

    /// **Swap**: exchange the left and right delay times.
    #[id = "swap"]
    pub swap: BoolParam,
}

/// Linear smoothing time for the continuous controls.
const SMOOTHING_MS: f32 = 20.0;

fn unit_param(name: &str, default: f32) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min: 0.0, max: 1.0 })
        .with_unit("%")
        .with_smoother(SmoothingStyle::Linear(SMOOTHING_MS))
        .with_value_to_string(formatters::v2s_f32_percentage(1))
        .with_string_to_value(formatters::s2v_f32_percentage())
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            zone: IntParam::new("Zone", 1, IntRange::Linear { min: 0, max: 3 })
                .with_value_to_string(Arc::new(|index| Zone::from_index(index).label().to_string())),

            rate: unit_param("Rate", 0.5),

            micro_rate: unit_param("μRate", 0.0),

            micro_rate_freq: FloatParam::new(
                "μRate Freq",
                2.0,
                FloatRange::Skewed {
                    min: 0.1,
                    max: 8.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" Hz")
            .with_smoother(SmoothingStyle::Linear(SMOOTHING_MS))
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            skew: FloatParam::new("Skew", 0.0, FloatRange::Linear { min: -1.0, max: 1.0 })
                .with_smoother(SmoothingStyle::Linear(SMOOTHING_MS))
                .with_value_to_string(formatters::v2s_f32_rounded(2)),

            repeats: FloatParam::new("Repeats", 0.3, FloatRange::Linear { min: 0.0, max: 1.2 })
                .with_unit("%")
                .with_smoother(SmoothingStyle::Linear(SMOOTHING_MS))
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            // Shows the region name next to the value, e.g. "0.45 (tape)".
            color: FloatParam::new("Color", 0.5, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_smoother(SmoothingStyle::Linear(SMOOTHING_MS))
                .with_value_to_string(Arc::new(|value| {
                    let (region, _) = ColorRegion::locate(value);
                    format!("{value:.2} ({})", region.name())
                })),

            halo: unit_param("Halo", 0.0),

            mix: unit_param("Mix", 0.5),

            hold: BoolParam::new("Hold", false),
            flip: BoolParam::new("Flip", false),
            ping_pong: BoolParam::new("Ping-Pong", false),
            swap: BoolParam::new("Swap", false),
        }
    }
}
