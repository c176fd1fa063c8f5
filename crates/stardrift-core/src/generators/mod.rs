//! The eight layered sound generators.
//!
//! Each [`Generator`] runs as one repeating task. `start` builds whatever the
//! layer keeps alive for the whole session and returns the delay to its first
//! tick; `tick` emits one sound event and returns the delay to the next.
//!
//! Per-event nodes schedule their own stop time and release themselves. Only
//! nodes with an unbounded lifetime are handed to [`GenContext::track`] so the
//! session can halt them on stop.

mod arpeggio;
mod bass;
mod bells;
mod drone;
mod pad;
mod sparkle;
mod sweep;
mod texture;

pub use arpeggio::Arpeggio;
pub use bass::BassPulse;
pub use bells::Bells;
pub use drone::Drone;
pub use pad::Pad;
pub use sparkle::Sparkle;
pub use sweep::Sweep;
pub use texture::Texture;

use rand::rngs::StdRng;
use rand::Rng;
use stardrift_dsp::{NodeId, ParamKind, Result, SynthContext, Waveform};
use std::fmt;

/// One independently timed sound behaviour.
pub trait Generator: Send {
    /// Which layer this generator implements.
    fn layer(&self) -> Layer;

    /// Build steady-state nodes. Returns the delay until the first tick, or
    /// `None` if the layer has no recurring work.
    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>>;

    /// Emit one event. Returns the delay until the next tick, or `None` to finish.
    fn tick(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>>;
}

/// The generator layers, in launch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Drone,
    Pad,
    Arpeggio,
    Sparkle,
    Bass,
    Sweep,
    Bells,
    Texture,
}

impl Layer {
    pub const ALL: [Layer; 8] = [
        Layer::Drone,
        Layer::Pad,
        Layer::Arpeggio,
        Layer::Sparkle,
        Layer::Bass,
        Layer::Sweep,
        Layer::Bells,
        Layer::Texture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Drone => "drone",
            Layer::Pad => "pad",
            Layer::Arpeggio => "arpeggio",
            Layer::Sparkle => "sparkle",
            Layer::Bass => "bass",
            Layer::Sweep => "sweep",
            Layer::Bells => "bells",
            Layer::Texture => "texture",
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            Layer::Drone => "low open-fifth hum through LFO-swept low-pass filters",
            Layer::Pad => "slow chord swells cycling through a progression",
            Layer::Arpeggio => "random notes from the current scale",
            Layer::Sparkle => "short high blips, sometimes in clusters of three",
            Layer::Bass => "infrequent sub-bass swells",
            Layer::Sweep => "band-pass whooshes travelling across the stereo field",
            Layer::Bells => "struck bell tones built from inharmonic partials",
            Layer::Texture => "looping pink-noise bed with slow level drift",
        }
    }

    /// Create a fresh generator for this layer.
    pub fn generator(self) -> Box<dyn Generator> {
        match self {
            Layer::Drone => Box::new(Drone::new()),
            Layer::Pad => Box::new(Pad::new()),
            Layer::Arpeggio => Box::new(Arpeggio::new()),
            Layer::Sparkle => Box::new(Sparkle::new()),
            Layer::Bass => Box::new(BassPulse::new()),
            Layer::Sweep => Box::new(Sweep::new()),
            Layer::Bells => Box::new(Bells::new()),
            Layer::Texture => Box::new(Texture::new()),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Indices into the progression and scale tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Harmony {
    pub progression: usize,
    pub scale: usize,
}

/// What a generator may touch while it runs.
///
/// Generators share the master gain (`output`) as their sink but cannot
/// replace it; only the session creates and destroys it.
pub struct GenContext<'a> {
    pub synth: &'a mut SynthContext,
    pub rng: &'a mut StdRng,
    pub harmony: &'a mut Harmony,
    output: NodeId,
    tracked: &'a mut Vec<NodeId>,
    noise: &'a mut Option<NodeId>,
}

impl<'a> GenContext<'a> {
    pub(crate) fn new(
        synth: &'a mut SynthContext,
        output: NodeId,
        rng: &'a mut StdRng,
        harmony: &'a mut Harmony,
        tracked: &'a mut Vec<NodeId>,
        noise: &'a mut Option<NodeId>,
    ) -> Self {
        Self {
            synth,
            rng,
            harmony,
            output,
            tracked,
            noise,
        }
    }

    /// Current context time in seconds.
    pub fn now(&self) -> f64 {
        self.synth.current_time()
    }

    pub fn sample_rate(&self) -> u32 {
        self.synth.sample_rate()
    }

    /// The shared master gain node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Hand a steady-state source to the session for explicit release on stop.
    pub fn track(&mut self, id: NodeId) {
        self.tracked.push(id);
    }

    /// Register the session's looping noise source.
    pub fn set_noise_source(&mut self, id: NodeId) {
        *self.noise = Some(id);
    }

    /// Uniform random value in `[lo, hi)`.
    pub fn random(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    /// Pick a random element of a non-empty slice.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.random_range(0..items.len())]
    }
}

/// Create a started low-frequency oscillator feeding a depth gain.
///
/// Returns `(lfo, depth)`; connect `depth` to the param to be modulated.
pub(crate) fn lfo(cx: &mut GenContext<'_>, rate_hz: f32, depth: f32) -> Result<(NodeId, NodeId)> {
    let now = cx.now();
    let osc = cx.synth.create_oscillator(Waveform::Sine);
    cx.synth
        .param_mut(osc, ParamKind::Frequency)?
        .set_value_at_time(rate_hz, now)?;
    let amount = cx.synth.create_gain();
    cx.synth
        .param_mut(amount, ParamKind::Gain)?
        .set_value_at_time(depth, now)?;
    cx.synth.connect(osc, amount)?;
    cx.synth.start(osc, now)?;
    Ok((osc, amount))
}

/// Shape a gain param as attack → exponential decay, ending at `end`.
pub(crate) fn pluck_envelope(
    cx: &mut GenContext<'_>,
    gain: NodeId,
    at: f64,
    peak: f32,
    attack: f64,
    end: f64,
) -> Result<()> {
    let env = cx.synth.param_mut(gain, ParamKind::Gain)?;
    env.set_value(0.0);
    env.set_value_at_time(0.0, at)?;
    env.linear_ramp_to_value_at_time(peak, at + attack)?;
    env.exponential_ramp_to_value_at_time(0.001, end)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rand::SeedableRng;
    use stardrift_dsp::ContextOptions;

    /// A context plus the session-owned state a generator needs.
    pub(crate) struct Rig {
        pub synth: SynthContext,
        pub master: NodeId,
        pub rng: StdRng,
        pub harmony: Harmony,
        pub tracked: Vec<NodeId>,
        pub noise: Option<NodeId>,
        /// Loudest sample rendered so far.
        pub peak: f32,
    }

    impl Rig {
        pub fn new(seed: u64) -> Self {
            let mut synth = SynthContext::new(ContextOptions::new(48_000)).unwrap();
            let master = synth.create_gain();
            synth.connect(master, synth.destination()).unwrap();
            synth.pin(master).unwrap();
            Self {
                synth,
                master,
                rng: StdRng::seed_from_u64(seed),
                harmony: Harmony::default(),
                tracked: Vec::new(),
                noise: None,
                peak: 0.0,
            }
        }

        pub fn cx(&mut self) -> GenContext<'_> {
            GenContext::new(
                &mut self.synth,
                self.master,
                &mut self.rng,
                &mut self.harmony,
                &mut self.tracked,
                &mut self.noise,
            )
        }

        /// Render `seconds` of audio, returning the peak sample.
        pub fn render(&mut self, seconds: f64) -> f32 {
            let frames = (seconds * self.synth.sample_rate() as f64) as usize;
            let mut out = vec![0.0; frames * 2];
            self.synth.render(&mut out);
            let peak = out.iter().fold(0.0f32, |m, v| m.max(v.abs()));
            self.peak = self.peak.max(peak);
            peak
        }

        /// Start `generator`, then keep ticking it whenever it is due for `seconds`.
        /// Returns the number of ticks.
        pub fn drive(&mut self, generator: &mut dyn Generator, seconds: f64) -> usize {
            let mut next = generator.start(&mut self.cx()).unwrap();
            let end = self.synth.current_time() + seconds;
            let mut ticks = 0;
            while self.synth.current_time() < end {
                if let Some(due) = next {
                    if self.synth.current_time() >= due {
                        let now = self.synth.current_time();
                        next = generator
                            .tick(&mut self.cx())
                            .unwrap()
                            .map(|delay| now + delay);
                        ticks += 1;
                    }
                }
                self.render(0.01);
            }
            ticks
        }
    }
}
