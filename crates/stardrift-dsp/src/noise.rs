//! Coloured noise buffers.

use rand::Rng;

/// Generate `len` samples of pink noise.
///
/// White noise is shaped by Paul Kellet's chain of one-pole filters, which
/// approximates a -3 dB/octave slope across the audible range. Output stays
/// roughly within [-1, 1].
pub fn pink_noise<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<f32> {
    let (mut b0, mut b1, mut b2, mut b3, mut b4, mut b5, mut b6) =
        (0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32);
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        let white: f32 = rng.random_range(-1.0..1.0);
        b0 = 0.99886 * b0 + white * 0.055_517_9;
        b1 = 0.99332 * b1 + white * 0.075_075_9;
        b2 = 0.96900 * b2 + white * 0.153_852;
        b3 = 0.86650 * b3 + white * 0.310_485_6;
        b4 = 0.55000 * b4 + white * 0.532_952_2;
        b5 = -0.7616 * b5 - white * 0.016_898;
        let pink = b0 + b1 + b2 + b3 + b4 + b5 + b6 + white * 0.5362;
        b6 = white * 0.115_926;
        out.push(pink * 0.11);
    }
    out
}
