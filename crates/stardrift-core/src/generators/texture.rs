//! A looping pink-noise bed under everything else.

use super::{lfo, GenContext, Generator, Layer};
use stardrift_dsp::{pink_noise, FilterKind, ParamKind, Result};
use std::sync::Arc;

const SECONDS: usize = 4;
const CUTOFF: f32 = 1200.0;
const LEVEL: f32 = 0.025;
const DRIFT_RATE: f32 = 0.03;
const DRIFT_DEPTH: f32 = 0.012;

#[derive(Debug, Default)]
pub struct Texture;

impl Texture {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Texture {
    fn layer(&self) -> Layer {
        Layer::Texture
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        let len = cx.sample_rate() as usize * SECONDS;
        let data: Arc<[f32]> = pink_noise(&mut *cx.rng, len).into();

        let source = cx.synth.create_buffer_source(data, true);
        let filter = cx.synth.create_filter(FilterKind::LowPass);
        cx.synth
            .param_mut(filter, ParamKind::Frequency)?
            .set_value_at_time(CUTOFF, now)?;
        cx.synth
            .param_mut(filter, ParamKind::Q)?
            .set_value_at_time(0.5, now)?;
        let gain = cx.synth.create_gain();
        cx.synth
            .param_mut(gain, ParamKind::Gain)?
            .set_value_at_time(LEVEL, now)?;

        let (drift, depth) = lfo(cx, DRIFT_RATE, DRIFT_DEPTH)?;
        cx.synth.connect_param(depth, gain, ParamKind::Gain)?;

        cx.synth.connect(source, filter)?;
        cx.synth.connect(filter, gain)?;
        cx.synth.connect(gain, cx.output())?;
        cx.synth.start(source, now)?;
        cx.track(drift);
        cx.set_noise_source(source);
        log::debug!("Texture started with {} noise samples", len);
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
    fn test_texture_registers_noise_source() {
        let mut rig = Rig::new(1);
        assert_eq!(Texture::new().start(&mut rig.cx()).unwrap(), None);
        let noise = rig.noise.unwrap();
        assert_eq!(rig.synth.node_type(noise), Some(stardrift_dsp::NodeType::BufferSource));
        // The noise source is released separately, not through the tracked list.
        assert_eq!(rig.tracked.len(), 1);
        assert!(!rig.tracked.contains(&noise));
    }

    #[test]
    fn test_noise_loops_past_buffer_end() {
        let mut rig = Rig::new(2);
        Texture::new().start(&mut rig.cx()).unwrap();
        rig.render(SECONDS as f64 + 1.0);
        let tail = rig.render(0.5);
        assert!(tail > 0.0);
        assert!(rig.synth.contains(rig.noise.unwrap()));
    }
}
