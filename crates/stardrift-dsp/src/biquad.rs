//! Second-order IIR filter sections (RBJ audio EQ cookbook).

use std::f64::consts::PI;
use std::fmt;

/// Filter response type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKind::LowPass => "lowpass",
            FilterKind::HighPass => "highpass",
            FilterKind::BandPass => "bandpass",
        };
        f.write_str(name)
    }
}

/// One channel of a biquad filter.
///
/// Coefficients are recomputed only when the cutoff or Q actually changes,
/// which keeps unmodulated filters cheap.
#[derive(Clone, Debug, Default)]
pub(crate) struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    tuned: Option<(f32, f32)>,
}

impl Biquad {
    /// Retune for `frequency` (Hz) and linear `q` at `sample_rate`.
    pub(crate) fn tune(&mut self, kind: FilterKind, frequency: f32, q: f32, sample_rate: f64) {
        if self.tuned == Some((frequency, q)) {
            return;
        }
        self.tuned = Some((frequency, q));

        let nyquist = sample_rate * 0.5;
        let f0 = (frequency as f64).clamp(10.0, nyquist * 0.99);
        let q = (q as f64).max(1e-4);
        let w0 = 2.0 * PI * f0 / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterKind::HighPass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
            FilterKind::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub(crate) fn process(&mut self, x: f32) -> f32 {
        let x = x as f64;
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y as f32
    }
}
