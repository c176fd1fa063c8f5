//! Continuous low drone: three detuned sines, each through its own slowly
//! swept low-pass filter.

use super::{lfo, GenContext, Generator, Layer};
use crate::tables::DRONE_FREQUENCIES;
use stardrift_dsp::{FilterKind, ParamKind, Result, Waveform};

const LEVEL: f32 = 0.15;
const FADE_IN: f64 = 4.0;
const CUTOFF: f32 = 200.0;
const SWEEP_DEPTH: f32 = 80.0;

#[derive(Debug, Default)]
pub struct Drone;

impl Drone {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Drone {
    fn layer(&self) -> Layer {
        Layer::Drone
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        let gain = cx.synth.create_gain();
        {
            let level = cx.synth.param_mut(gain, ParamKind::Gain)?;
            level.set_value(0.0);
            level.set_value_at_time(0.0, now)?;
            level.linear_ramp_to_value_at_time(LEVEL, now + FADE_IN)?;
        }
        cx.synth.connect(gain, cx.output())?;

        for (i, &freq) in DRONE_FREQUENCIES.iter().enumerate() {
            let osc = cx.synth.create_oscillator(Waveform::Sine);
            cx.synth
                .param_mut(osc, ParamKind::Frequency)?
                .set_value_at_time(freq, now)?;
            cx.synth
                .param_mut(osc, ParamKind::Detune)?
                .set_value_at_time((i as f32 - 1.0) * 5.0, now)?;

            let filter = cx.synth.create_filter(FilterKind::LowPass);
            cx.synth
                .param_mut(filter, ParamKind::Frequency)?
                .set_value_at_time(CUTOFF, now)?;
            cx.synth
                .param_mut(filter, ParamKind::Q)?
                .set_value_at_time(1.0, now)?;

            let (sweep, depth) = lfo(cx, 0.05 + i as f32 * 0.02, SWEEP_DEPTH)?;
            cx.synth.connect_param(depth, filter, ParamKind::Frequency)?;

            cx.synth.connect(osc, filter)?;
            cx.synth.connect(filter, gain)?;
            cx.synth.start(osc, now)?;
            cx.track(osc);
            cx.track(sweep);
        }

        log::debug!("Drone started on {:?} Hz", DRONE_FREQUENCIES);
        Ok(None)
    }

    fn tick(&mut self, _cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::Rig;

    #[test]
    fn test_drone_tracks_all_sources() {
        let mut rig = Rig::new(1);
        let next = Drone::new().start(&mut rig.cx()).unwrap();
        assert_eq!(next, None);
        // One oscillator and one LFO per voice.
        assert_eq!(rig.tracked.len(), DRONE_FREQUENCIES.len() * 2);
        assert_eq!(rig.synth.active_sources(), DRONE_FREQUENCIES.len() * 2);
    }

    #[test]
    fn test_drone_fades_in() {
        let mut rig = Rig::new(2);
        Drone::new().start(&mut rig.cx()).unwrap();
        let early = rig.render(0.05);
        rig.render(4.0);
        let settled = rig.render(1.0);
        assert!(early < settled, "{} !< {}", early, settled);
        assert!(settled > 0.01);
    }

    #[test]
    fn test_drone_is_continuous() {
        let mut rig = Rig::new(3);
        Drone::new().start(&mut rig.cx()).unwrap();
        rig.render(60.0);
        assert_eq!(rig.synth.active_sources(), DRONE_FREQUENCIES.len() * 2);
    }
}
