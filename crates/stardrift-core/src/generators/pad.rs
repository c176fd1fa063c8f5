//! Slow chord swells over a shared, gently breathing pad bus.

use super::{lfo, GenContext, Generator, Layer};
use crate::tables::{pick_other, PROGRESSIONS};
use stardrift_dsp::{FilterKind, NodeId, ParamKind, Result, Waveform};

const BUS_CUTOFF: f32 = 900.0;
const BUS_LEVEL: f32 = 0.7;
const NOTE_PEAK: f32 = 0.05;
/// Attack end, sustain end and release end, relative to the chord onset.
const ENVELOPE: (f64, f64, f64) = (3.0, 7.0, 10.0);
const DETUNE_CENTS: f64 = 4.0;

#[derive(Debug, Default)]
pub struct Pad {
    bus: Option<NodeId>,
    chord: usize,
    next_swap: f64,
}

impl Pad {
    pub fn new() -> Self {
        Self::default()
    }

    fn play_chord(&mut self, cx: &mut GenContext<'_>, bus: NodeId) -> Result<()> {
        let now = cx.now();
        let progression = &PROGRESSIONS[cx.harmony.progression % PROGRESSIONS.len()];
        let chord = progression.chords[self.chord % progression.chords.len()];
        self.chord = (self.chord + 1) % progression.chords.len();

        let (attack, sustain, release) = ENVELOPE;
        for &freq in chord {
            let osc = cx.synth.create_oscillator(Waveform::Triangle);
            cx.synth
                .param_mut(osc, ParamKind::Frequency)?
                .set_value_at_time(freq, now)?;
            let detune = cx.random(-DETUNE_CENTS, DETUNE_CENTS) as f32;
            cx.synth
                .param_mut(osc, ParamKind::Detune)?
                .set_value_at_time(detune, now)?;

            let gain = cx.synth.create_gain();
            let env = cx.synth.param_mut(gain, ParamKind::Gain)?;
            env.set_value(0.0);
            env.set_value_at_time(0.0, now)?;
            env.linear_ramp_to_value_at_time(NOTE_PEAK, now + attack)?;
            env.linear_ramp_to_value_at_time(NOTE_PEAK, now + sustain)?;
            env.linear_ramp_to_value_at_time(0.0, now + release)?;

            cx.synth.connect(osc, gain)?;
            cx.synth.connect(gain, bus)?;
            cx.synth.start(osc, now)?;
            cx.synth.stop(osc, now + release + 0.1)?;
        }
        log::trace!("Pad chord {:?} from {}", chord, progression.name);
        Ok(())
    }
}

impl Generator for Pad {
    fn layer(&self) -> Layer {
        Layer::Pad
    }

    fn start(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let now = cx.now();
        let filter = cx.synth.create_filter(FilterKind::LowPass);
        cx.synth
            .param_mut(filter, ParamKind::Frequency)?
            .set_value_at_time(BUS_CUTOFF, now)?;
        cx.synth
            .param_mut(filter, ParamKind::Q)?
            .set_value_at_time(0.8, now)?;
        let level = cx.synth.create_gain();
        cx.synth
            .param_mut(level, ParamKind::Gain)?
            .set_value_at_time(BUS_LEVEL, now)?;
        cx.synth.connect(filter, level)?;
        cx.synth.connect(level, cx.output())?;
        // The bus outlives every chord routed through it.
        cx.synth.pin(filter)?;
        cx.synth.pin(level)?;

        let (cutoff_lfo, cutoff_depth) = lfo(cx, 0.07, 300.0)?;
        cx.synth.connect_param(cutoff_depth, filter, ParamKind::Frequency)?;
        let (level_lfo, level_depth) = lfo(cx, 0.11, 0.15)?;
        cx.synth.connect_param(level_depth, level, ParamKind::Gain)?;
        cx.track(cutoff_lfo);
        cx.track(level_lfo);

        self.bus = Some(filter);
        self.chord = 0;
        self.next_swap = now + cx.random(30.0, 60.0);
        Ok(Some(0.5))
    }

    fn tick(&mut self, cx: &mut GenContext<'_>) -> Result<Option<f64>> {
        let Some(bus) = self.bus else {
            return Ok(None);
        };
        let now = cx.now();
        if now >= self.next_swap {
            let next = pick_other(&mut *cx.rng, PROGRESSIONS.len(), cx.harmony.progression);
            cx.harmony.progression = next;
            self.chord = 0;
            self.next_swap = now + cx.random(30.0, 60.0);
            log::debug!("Pad progression -> {}", PROGRESSIONS[next].name);
        }
        self.play_chord(cx, bus)?;
        Ok(Some(cx.random(8.0, 12.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::Rig;

    #[test]
    fn test_pad_tracks_only_its_lfos() {
        let mut rig = Rig::new(1);
        let first = Pad::new().start(&mut rig.cx()).unwrap();
        assert_eq!(first, Some(0.5));
        assert_eq!(rig.tracked.len(), 2);
    }

    #[test]
    fn test_chord_notes_release_themselves() {
        let mut rig = Rig::new(2);
        let mut pad = Pad::new();
        pad.start(&mut rig.cx()).unwrap();
        let baseline = rig.synth.node_count();
        let next = pad.tick(&mut rig.cx()).unwrap().unwrap();
        assert!((8.0..12.0).contains(&next));
        let chord_len = PROGRESSIONS[0].chords[0].len();
        assert_eq!(rig.synth.node_count(), baseline + chord_len * 2);

        rig.render(10.5);
        // Notes and their envelopes are gone; the pinned bus survives.
        assert_eq!(rig.synth.node_count(), baseline);
    }

    #[test]
    fn test_progression_swaps() {
        let mut rig = Rig::new(3);
        let mut pad = Pad::new();
        pad.start(&mut rig.cx()).unwrap();
        pad.next_swap = 0.0;
        pad.tick(&mut rig.cx()).unwrap();
        assert_ne!(rig.harmony.progression, 0);
        assert!(pad.next_swap >= 30.0);
    }

    #[test]
    fn test_chords_cycle_through_progression() {
        let mut rig = Rig::new(4);
        let mut pad = Pad::new();
        pad.start(&mut rig.cx()).unwrap();
        for expected in 1..=PROGRESSIONS[0].chords.len() {
            pad.tick(&mut rig.cx()).unwrap();
            assert_eq!(pad.chord, expected % PROGRESSIONS[0].chords.len());
        }
    }
}
