//! Struck bell tones built from a fixed table of inharmonic partials.

use super::{GenContext, Generator, Layer};
use crate::tables::{BELL_BASES, BELL_PARTIALS};
use stardrift_dsp::{ParamKind, Result, Waveform};

const LEVEL: f32 = 0.05;
const STRIKE: f64 = 0.005;
/// Ring time of a partial with decay scale 1.0.
const RING: f64 = 6.0;
const PAN_SPREAD: f64 = 0.3;

#[derive(Debug, Default)]
pub struct Bells;

impl Bells {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Bells {
    fn layer(&self) -> Layer {
        Layer::Bells
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        Ok(Some(cx.random(2.0, 6.0)))
    }

    fn tick(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        let base = cx.pick(BELL_BASES);
        let base_pan = cx.random(-0.6, 0.6);

        for partial in BELL_PARTIALS {
            let ring = RING * partial.decay as f64;
            let pan = (base_pan + cx.random(-PAN_SPREAD, PAN_SPREAD)).clamp(-1.0, 1.0) as f32;

            let osc = cx.synth.create_oscillator(Waveform::Sine);
            cx.synth
                .param_mut(osc, ParamKind::Frequency)?
                .set_value_at_time(base * partial.ratio, now)?;

            let gain = cx.synth.create_gain();
            let env = cx.synth.param_mut(gain, ParamKind::Gain)?;
            env.set_value(0.0);
            env.set_value_at_time(0.0, now)?;
            env.linear_ramp_to_value_at_time(partial.amplitude * LEVEL, now + STRIKE)?;
            env.exponential_ramp_to_value_at_time(0.0001, now + ring)?;

            let panner = cx.synth.create_panner();
            cx.synth
                .param_mut(panner, ParamKind::Pan)?
                .set_value_at_time(pan, now)?;

            cx.synth.connect(osc, gain)?;
            cx.synth.connect(gain, panner)?;
            cx.synth.connect(panner, cx.output())?;
            cx.synth.start(osc, now)?;
            cx.synth.stop(osc, now + ring + 0.05)?;
        }
        log::trace!("Bell struck at {:.2} Hz", base);

        Ok(Some(cx.random(4.0, 12.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::Rig;

    #[test]
    fn test_one_voice_per_partial() {
        let mut rig = Rig::new(1);
        let next = Bells::new().tick(&mut rig.cx()).unwrap().unwrap();
        assert!((4.0..12.0).contains(&next));
        assert_eq!(rig.synth.active_sources(), BELL_PARTIALS.len());
    }

    #[test]
    fn test_higher_partials_die_first() {
        let mut rig = Rig::new(2);
        Bells::new().tick(&mut rig.cx()).unwrap();
        let shortest = BELL_PARTIALS
            .iter()
            .map(|p| p.decay)
            .fold(f32::MAX, f32::min) as f64;
        rig.render(RING * shortest + 0.2);
        let remaining = rig.synth.active_sources();
        assert!(remaining > 0 && remaining < BELL_PARTIALS.len());
        rig.render(RING);
        assert_eq!(rig.synth.active_sources(), 0);
    }
}
