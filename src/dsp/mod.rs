//! # DSP (Digital Signal Processing)
//!
//! The delay kernel and the building blocks it is made of. Nothing in here
//! knows about plugin formats; a host can drive [`kernel::DelayKernel`]
//! directly.
//!
//! - **`control`**: the 13 controls, block-constant or per-sample.
//! - **`ring_buffer`**: ten seconds of stereo history with forward and
//!   flipped fractional reads.
//! - **`delay_time`**: zones, μRate LFO, skew/swap and delay smoothing.
//! - **`filter`**: biquad designs and the five-region color bank.
//! - **`halo`**: the four-stage allpass diffuser.
//! - **`saturator`**: the two curves that bound the feedback loop.
//! - **`kernel`**: hold/flip/ping-pong, feedback, writes and the mix.
//! - **`presets`**: factory settings.

pub mod control;
pub mod delay_time;
pub mod filter;
pub mod halo;
pub mod kernel;
pub mod presets;
pub mod ring_buffer;
pub mod saturator;
