//! Sparse melodic notes drawn from the current scale.

use super::{pluck_envelope, GenContext, Generator, Layer};
use crate::tables::{pick_other, SCALES};
use stardrift_dsp::{FilterKind, ParamKind, Result, Waveform};

const SHAPES: [Waveform; 3] = [Waveform::Sine, Waveform::Triangle, Waveform::Sawtooth];
const PEAK: f32 = 0.06;
const ATTACK: f64 = 0.08;
const OCTAVE_UP_CHANCE: f64 = 0.2;
const RUN_CHANCE: f64 = 0.3;

#[derive(Debug, Default)]
pub struct Arpeggio {
    next_swap: f64,
}

impl Arpeggio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Generator for Arpeggio {
    fn layer(&self) -> Layer {
        Layer::Arpeggio
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        self.next_swap = cx.now() + cx.random(20.0, 40.0);
        Ok(Some(cx.random(0.5, 1.5)))
    }

    fn tick(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        if now >= self.next_swap {
            let next = pick_other(&mut *cx.rng, SCALES.len(), cx.harmony.scale);
            cx.harmony.scale = next;
            self.next_swap = now + cx.random(20.0, 40.0);
            log::debug!("Arpeggio scale -> {}", SCALES[next].name);
        }

        let scale = &SCALES[cx.harmony.scale % SCALES.len()];
        let mut freq = cx.pick(scale.notes);
        if cx.chance(OCTAVE_UP_CHANCE) {
            freq *= 2.0;
        }
        let shape = cx.pick(&SHAPES);
        let duration = cx.random(1.5, 2.5);

        let osc = cx.synth.create_oscillator(shape);
        cx.synth
            .param_mut(osc, ParamKind::Frequency)?
            .set_value_at_time(freq, now)?;

        let filter = cx.synth.create_filter(FilterKind::LowPass);
        let cutoff = cx.random(1200.0, 3200.0) as f32;
        cx.synth
            .param_mut(filter, ParamKind::Frequency)?
            .set_value_at_time(cutoff, now)?;

        let gain = cx.synth.create_gain();
        pluck_envelope(cx, gain, now, PEAK, ATTACK, now + duration)?;

        let panner = cx.synth.create_panner();
        let pan = cx.random(-0.7, 0.7) as f32;
        cx.synth
            .param_mut(panner, ParamKind::Pan)?
            .set_value_at_time(pan, now)?;

        cx.synth.connect(osc, filter)?;
        cx.synth.connect(filter, gain)?;
        cx.synth.connect(gain, panner)?;
        cx.synth.connect(panner, cx.output())?;
        cx.synth.start(osc, now)?;
        cx.synth.stop(osc, now + duration + 0.05)?;
        log::trace!("Arpeggio {} {:.1} Hz pan {:.2}", shape, freq, pan);

        let gap = if cx.chance(RUN_CHANCE) {
            cx.random(0.12, 0.3)
        } else {
            cx.random(0.8, 2.2)
        };
        Ok(Some(gap))
    }
}
