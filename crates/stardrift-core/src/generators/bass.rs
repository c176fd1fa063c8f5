//! Infrequent sub-bass swells.

use super::{GenContext, Generator, Layer};
use crate::tables::BASS_NOTES;
use stardrift_dsp::{FilterKind, ParamKind, Result, Waveform};

const PEAK: f32 = 0.18;
const ATTACK: f64 = 2.5;
const RELEASE_END: f64 = 6.5;
const CUTOFF: f32 = 120.0;

#[derive(Debug, Default)]
pub struct BassPulse;

impl BassPulse {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for BassPulse {
    fn layer(&self) -> Layer {
        Layer::Bass
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        Ok(Some(cx.random(2.0, 6.0)))
    }

    fn tick(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        let freq = cx.pick(BASS_NOTES);

        let osc = cx.synth.create_oscillator(Waveform::Sine);
        cx.synth
            .param_mut(osc, ParamKind::Frequency)?
            .set_value_at_time(freq, now)?;
        let filter = cx.synth.create_filter(FilterKind::LowPass);
        cx.synth
            .param_mut(filter, ParamKind::Frequency)?
            .set_value_at_time(CUTOFF, now)?;

        let gain = cx.synth.create_gain();
        let env = cx.synth.param_mut(gain, ParamKind::Gain)?;
        env.set_value(0.0);
        env.set_value_at_time(0.0, now)?;
        env.linear_ramp_to_value_at_time(PEAK, now + ATTACK)?;
        env.exponential_ramp_to_value_at_time(0.001, now + RELEASE_END)?;

        cx.synth.connect(osc, filter)?;
        cx.synth.connect(filter, gain)?;
        cx.synth.connect(gain, cx.output())?;
        cx.synth.start(osc, now)?;
        cx.synth.stop(osc, now + RELEASE_END + 0.1)?;
        log::trace!("Bass pulse {:.2} Hz", freq);

        Ok(Some(cx.random(5.0, 13.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::Rig;

    #[test]
    fn test_pulse_swells_and_releases() {
        let mut rig = Rig::new(1);
        let baseline = rig.synth.node_count();
        let next = BassPulse::new().tick(&mut rig.cx()).unwrap().unwrap();
        assert!((5.0..13.0).contains(&next));

        let attack = rig.render(0.5);
        let swell = rig.render(2.5);
        assert!(swell > attack);
        rig.render(4.0);
        assert_eq!(rig.synth.node_count(), baseline);
    }
}
