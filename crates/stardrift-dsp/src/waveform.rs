//! Periodic oscillator shapes.

use std::f64::consts::TAU;
use std::fmt;

/// Oscillator wave shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    /// All shapes, in declaration order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::Sawtooth,
    ];

    /// Sample the shape at `phase` (cycles, wrapped into `[0, 1)`).
    pub fn sample(self, phase: f64) -> f32 {
        let p = phase.rem_euclid(1.0);
        let v = match self {
            Waveform::Sine => (p * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
        };
        v as f32
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
        };
        f.write_str(name)
    }
}
