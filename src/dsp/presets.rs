//! Factory presets.
//!
//! Each preset sets the continuous controls only; hold, flip, ping-pong
//! and swap are left as they are. A few presets don't care about the μRate
//! frequency and leave it alone too.

use super::control::FrameParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub zone: f32,
    pub rate: f32,
    pub micro_rate: f32,
    pub micro_rate_freq: Option<f32>,
    pub skew: f32,
    pub repeats: f32,
    pub color: f32,
    pub halo: f32,
    pub mix: f32,
}

impl Preset {
    /// Overlay this preset onto `params`.
    pub fn apply(&self, params: &mut FrameParams) {
        params.zone = self.zone;
        params.rate = self.rate;
        params.micro_rate = self.micro_rate;
        if let Some(freq) = self.micro_rate_freq {
            params.micro_rate_freq = freq;
        }
        params.skew = self.skew;
        params.repeats = self.repeats;
        params.color = self.color;
        params.halo = self.halo;
        params.mix = self.mix;
    }

    pub fn find(name: &str) -> Option<&'static Preset> {
        PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

pub const PRESETS: [Preset; 8] = [
    // Zone A
    Preset {
        name: "karplus",
        zone: 0.0,
        rate: 0.8,
        micro_rate: 0.0,
        micro_rate_freq: None,
        skew: 0.0,
        repeats: 0.85,
        color: 0.3,
        halo: 0.0,
        mix: 0.5,
    },
    Preset {
        name: "flange",
        zone: 0.0,
        rate: 0.3,
        micro_rate: 0.8,
        micro_rate_freq: Some(0.3),
        skew: 0.5,
        repeats: 0.7,
        color: 0.5,
        halo: 0.3,
        mix: 0.5,
    },
    // Zone B
    Preset {
        name: "chorus",
        zone: 1.0,
        rate: 0.2,
        micro_rate: 0.6,
        micro_rate_freq: Some(1.5),
        skew: 0.3,
        repeats: 0.3,
        color: 0.6,
        halo: 0.5,
        mix: 0.4,
    },
    Preset {
        name: "slapback",
        zone: 1.0,
        rate: 0.4,
        micro_rate: 0.0,
        micro_rate_freq: None,
        skew: 0.0,
        repeats: 0.3,
        color: 0.4,
        halo: 0.2,
        mix: 0.3,
    },
    // Zone C
    Preset {
        name: "dubEcho",
        zone: 2.0,
        rate: 0.5,
        micro_rate: 0.1,
        micro_rate_freq: None,
        skew: 0.2,
        repeats: 0.6,
        color: 0.3,
        halo: 0.6,
        mix: 0.5,
    },
    Preset {
        name: "tapeDelay",
        zone: 2.0,
        rate: 0.6,
        micro_rate: 0.2,
        micro_rate_freq: Some(0.5),
        skew: 0.0,
        repeats: 0.5,
        color: 0.45,
        halo: 0.4,
        mix: 0.4,
    },
    // Zone D
    Preset {
        name: "ambient",
        zone: 3.0,
        rate: 0.5,
        micro_rate: 0.3,
        micro_rate_freq: Some(0.2),
        skew: 0.4,
        repeats: 0.8,
        color: 0.7,
        halo: 0.8,
        mix: 0.6,
    },
    Preset {
        name: "shimmer",
        zone: 3.0,
        rate: 0.7,
        micro_rate: 0.4,
        micro_rate_freq: Some(2.0),
        skew: 0.6,
        repeats: 0.9,
        color: 0.85,
        halo: 1.0,
        mix: 0.7,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::kernel::DelayKernel;

    #[test]
    fn test_presets_are_in_range() {
        for preset in &PRESETS {
            let mut p = FrameParams::default();
            preset.apply(&mut p);
            assert_eq!(p, p.sanitized(), "{} has out-of-range values", preset.name);
        }
    }

    #[test]
    fn test_apply_keeps_toggles_and_unset_frequency() {
        let mut p = FrameParams {
            micro_rate_freq: 6.0,
            hold: true,
            ping_pong: true,
            ..FrameParams::default()
        };
        Preset::find("karplus").unwrap().apply(&mut p);
        assert_eq!(p.micro_rate_freq, 6.0);
        assert!(p.hold && p.ping_pong);
        assert_eq!(p.repeats, 0.85);

        Preset::find("TAPEDELAY").unwrap().apply(&mut p);
        assert_eq!(p.micro_rate_freq, 0.5);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(Preset::find("reverb").is_none());
    }

    /// Every preset stays finite and bounded when driven with a loud signal.
    #[test]
    fn test_presets_run_stable() {
        for preset in &PRESETS {
            let mut k = DelayKernel::new(8_000.0).unwrap();
            let mut p = FrameParams::default();
            preset.apply(&mut p);
            for i in 0..40_000 {
                let x = if i < 4_000 { ((i % 40) as f32 / 20.0) - 1.0 } else { 0.0 };
                let (l, r) = k.process_frame(x, x, &p);
                assert!(l.is_finite() && r.is_finite(), "{}", preset.name);
                assert!(l.abs() < 3.0 && r.abs() < 3.0, "{}: {l} {r}", preset.name);
            }
        }
    }
}
