//! High, short sine blips scattered across the stereo field.

use super::{pluck_envelope, GenContext, Generator, Layer};
use stardrift_dsp::{ParamKind, Result, Waveform};

const CLUSTER_CHANCE: f64 = 0.15;
const CLUSTER_OFFSETS: [f64; 3] = [0.0, 0.09, 0.18];
const ATTACK: f64 = 0.03;

#[derive(Debug, Default)]
pub struct Sparkle;

impl Sparkle {
    pub fn new() -> Self {
        Self
    }

    fn blip(&self, cx: &mut GenContext<'_>, at: f64) -> Result<()> {
        let freq = cx.random(2000.0, 6000.0) as f32;
        let decay = cx.random(0.2, 0.5);
        let peak = cx.random(0.02, 0.04) as f32;
        let pan = cx.random(-0.9, 0.9) as f32;

        let osc = cx.synth.create_oscillator(Waveform::Sine);
        cx.synth
            .param_mut(osc, ParamKind::Frequency)?
            .set_value_at_time(freq, at)?;
        let gain = cx.synth.create_gain();
        pluck_envelope(cx, gain, at, peak, ATTACK, at + decay)?;
        let panner = cx.synth.create_panner();
        cx.synth
            .param_mut(panner, ParamKind::Pan)?
            .set_value_at_time(pan, at)?;

        cx.synth.connect(osc, gain)?;
        cx.synth.connect(gain, panner)?;
        cx.synth.connect(panner, cx.output())?;
        cx.synth.start(osc, at)?;
        cx.synth.stop(osc, at + decay + 0.02)?;
        Ok(())
    }
}

impl Generator for Sparkle {
    fn layer(&self) -> Layer {
        Layer::Sparkle
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        Ok(Some(cx.random(1.0, 3.0)))
    }

    fn tick(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        if cx.chance(CLUSTER_CHANCE) {
            for offset in CLUSTER_OFFSETS {
                self.blip(cx, now + offset)?;
            }
            log::trace!("Sparkle cluster at {:.2}s", now);
        } else {
            self.blip(cx, now)?;
        }
        Ok(Some(cx.random(0.4, 2.4)))
    }
}
