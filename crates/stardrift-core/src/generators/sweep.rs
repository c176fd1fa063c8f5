//! Band-pass "whoosh" sweeps travelling across the stereo field.

use super::{GenContext, Generator, Layer};
use stardrift_dsp::{FilterKind, ParamKind, Result, Waveform};

const LOW: f32 = 200.0;
const HIGH: f32 = 2400.0;
const Q: f32 = 4.0;
const PEAK: f32 = 0.04;

#[derive(Debug, Default)]
pub struct Sweep;

impl Sweep {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Sweep {
    fn layer(&self) -> Layer {
        Layer::Sweep
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        Ok(Some(cx.random(3.0, 8.0)))
    }

    fn tick(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        let duration = cx.random(3.0, 6.0);
        let end = now + duration;
        let rising = cx.chance(0.5);
        let (from, to) = if rising { (LOW, HIGH) } else { (HIGH, LOW) };
        let pan_from = if cx.chance(0.5) { -0.8 } else { 0.8 };

        let osc = cx.synth.create_oscillator(Waveform::Sawtooth);
        let pitch = cx.random(60.0, 120.0) as f32;
        cx.synth
            .param_mut(osc, ParamKind::Frequency)?
            .set_value_at_time(pitch, now)?;

        let filter = cx.synth.create_filter(FilterKind::BandPass);
        cx.synth
            .param_mut(filter, ParamKind::Q)?
            .set_value_at_time(Q, now)?;
        let centre = cx.synth.param_mut(filter, ParamKind::Frequency)?;
        centre.set_value_at_time(from, now)?;
        centre.exponential_ramp_to_value_at_time(to, end)?;

        let gain = cx.synth.create_gain();
        let env = cx.synth.param_mut(gain, ParamKind::Gain)?;
        env.set_value(0.0);
        env.set_value_at_time(0.0, now)?;
        env.linear_ramp_to_value_at_time(PEAK, now + duration / 2.0)?;
        env.exponential_ramp_to_value_at_time(0.001, end)?;

        let panner = cx.synth.create_panner();
        let pan = cx.synth.param_mut(panner, ParamKind::Pan)?;
        pan.set_value_at_time(pan_from, now)?;
        pan.linear_ramp_to_value_at_time(-pan_from, end)?;

        cx.synth.connect(osc, filter)?;
        cx.synth.connect(filter, gain)?;
        cx.synth.connect(gain, panner)?;
        cx.synth.connect(panner, cx.output())?;
        cx.synth.start(osc, now)?;
        cx.synth.stop(osc, end + 0.1)?;
        log::trace!(
            "Sweep {} over {:.1}s",
            if rising { "up" } else { "down" },
            duration
        );

        Ok(Some(cx.random(8.0, 23.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::Rig;
    use stardrift_dsp::NodeType;

    #[test]
    fn test_sweep_moves_filter_and_pan() {
        let mut rig = Rig::new(1);
        let next = Sweep::new().tick(&mut rig.cx()).unwrap().unwrap();
        assert!((8.0..23.0).contains(&next));

        let filter = rig
            .synth
            .inputs(rig.master)
            .unwrap()
            .iter()
            .copied()
            .find_map(|panner| {
                let gain = rig.synth.inputs(panner)?[0];
                let filter = rig.synth.inputs(gain)?[0];
                (rig.synth.node_type(filter) == Some(NodeType::Filter)).then_some(filter)
            })
            .unwrap();
        let target = rig.synth.param(filter, ParamKind::Frequency).unwrap().target();
        assert!(target == LOW || target == HIGH);

        rig.render(1.0);
        let centre = rig.synth.param(filter, ParamKind::Frequency).unwrap().value();
        assert!(centre > LOW && centre < HIGH, "centre {}", centre);
    }

    #[test]
    fn test_sweep_releases_itself() {
        let mut rig = Rig::new(2);
        let baseline = rig.synth.node_count();
        Sweep::new().tick(&mut rig.cx()).unwrap();
        rig.render(6.5);
        assert_eq!(rig.synth.node_count(), baseline);
    }
}
