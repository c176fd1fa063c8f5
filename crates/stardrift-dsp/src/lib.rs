//! Stardrift DSP - a small software synthesis graph.
//!
//! This crate provides the synthesis context the ambient engine renders
//! through:
//!
//! - **Context** - [`SynthContext`] owns the node graph and the output clock
//! - **Nodes** - oscillators, gains, biquad filters, stereo panners, buffer players
//! - **Params** - [`AudioParam`] automation (set, linear/exponential ramps, targets)
//!   plus audio-rate modulation by other nodes
//! - **Noise** - [`pink_noise`] buffers for textures
//!
//! # Example
//!
//! ```
//! use stardrift_dsp::{ContextOptions, ParamKind, SynthContext, Waveform};
//!
//! let mut ctx = SynthContext::new(ContextOptions::default()).unwrap();
//! let osc = ctx.create_oscillator(Waveform::Sine);
//! let gain = ctx.create_gain();
//! ctx.connect(osc, gain).unwrap();
//! ctx.connect(gain, ctx.destination()).unwrap();
//!
//! let now = ctx.current_time();
//! let env = ctx.param_mut(gain, ParamKind::Gain).unwrap();
//! env.set_value_at_time(0.0, now).unwrap();
//! env.linear_ramp_to_value_at_time(0.2, now + 0.05).unwrap();
//! ctx.start(osc, now).unwrap();
//! ctx.stop(osc, now + 0.5).unwrap();
//!
//! let mut out = vec![0.0f32; 2 * 4_800];
//! ctx.render(&mut out);
//! ```

pub mod biquad;
pub mod context;
pub mod errors;
pub mod node;
pub mod noise;
pub mod param;
pub mod waveform;

pub use biquad::FilterKind;
pub use context::{ContextOptions, ContextState, SynthContext, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use errors::{Result, SynthError};
pub use node::{Frame, NodeId, NodeType, SourceState};
pub use noise::pink_noise;
pub use param::{AudioParam, ParamKind};
pub use waveform::Waveform;
