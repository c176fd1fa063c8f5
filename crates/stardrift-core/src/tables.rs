//! Static harmony and timbre tables consulted by the generators.

/// A named sequence of chords; each chord is a set of frequencies in Hz.
#[derive(Debug, Clone, Copy)]
pub struct Progression {
    pub name: &'static str,
    pub chords: &'static [&'static [f32]],
}

/// A named scale as a list of frequencies in Hz.
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    pub name: &'static str,
    pub notes: &'static [f32],
}

/// One overtone of a struck bell.
#[derive(Debug, Clone, Copy)]
pub struct BellPartial {
    /// Frequency relative to the strike note.
    pub ratio: f32,
    /// Relative loudness.
    pub amplitude: f32,
    /// Relative ring time; higher partials die away faster.
    pub decay: f32,
}

pub const PROGRESSIONS: &[Progression] = &[
    Progression {
        name: "Am - F - C - G",
        chords: &[
            &[220.00, 261.63, 329.63],
            &[174.61, 220.00, 261.63],
            &[196.00, 261.63, 329.63],
            &[196.00, 246.94, 293.66],
        ],
    },
    Progression {
        name: "Am7 - Dm9 - Fmaj7 - Em7",
        chords: &[
            &[220.00, 261.63, 329.63, 392.00],
            &[146.83, 174.61, 220.00, 329.63],
            &[174.61, 220.00, 261.63, 329.63],
            &[164.81, 196.00, 246.94, 293.66],
        ],
    },
    Progression {
        name: "Dsus2 - Bbmaj7 - Fadd9 - C",
        chords: &[
            &[146.83, 164.81, 220.00],
            &[116.54, 146.83, 174.61, 220.00],
            &[174.61, 196.00, 261.63],
            &[130.81, 196.00, 261.63, 329.63],
        ],
    },
    Progression {
        name: "Em9 - Cmaj7 - G - D",
        chords: &[
            &[164.81, 196.00, 246.94, 369.99],
            &[130.81, 164.81, 196.00, 246.94],
            &[196.00, 246.94, 293.66],
            &[146.83, 185.00, 220.00],
        ],
    },
];

pub const SCALES: &[Scale] = &[
    Scale {
        name: "A minor pentatonic",
        notes: &[440.00, 523.25, 587.33, 659.25, 783.99, 880.00],
    },
    Scale {
        name: "D dorian",
        notes: &[293.66, 329.63, 349.23, 392.00, 440.00, 493.88, 523.25, 587.33],
    },
    Scale {
        name: "E aeolian",
        notes: &[329.63, 369.99, 392.00, 440.00, 493.88, 523.25, 587.33, 659.25],
    },
    Scale {
        name: "F lydian",
        notes: &[349.23, 392.00, 440.00, 493.88, 523.25, 587.33, 659.25, 698.46],
    },
];

/// Strike notes for the bell layer.
pub const BELL_BASES: &[f32] = &[523.25, 587.33, 659.25, 783.99, 880.00, 1046.50];

/// Partials approximating a church-bell spectrum (hum, prime, tierce, quint, nominal).
pub const BELL_PARTIALS: &[BellPartial] = &[
    BellPartial {
        ratio: 0.5,
        amplitude: 0.6,
        decay: 1.0,
    },
    BellPartial {
        ratio: 1.0,
        amplitude: 1.0,
        decay: 0.8,
    },
    BellPartial {
        ratio: 1.2,
        amplitude: 0.5,
        decay: 0.6,
    },
    BellPartial {
        ratio: 1.5,
        amplitude: 0.35,
        decay: 0.45,
    },
    BellPartial {
        ratio: 2.0,
        amplitude: 0.45,
        decay: 0.35,
    },
    BellPartial {
        ratio: 2.76,
        amplitude: 0.2,
        decay: 0.25,
    },
];

/// Frequencies of the low drone (A1, E2, A2 - an open fifth).
pub const DRONE_FREQUENCIES: &[f32] = &[55.0, 82.5, 110.0];

/// Sub-bass pulse notes (D1, E1, A1).
pub const BASS_NOTES: &[f32] = &[36.71, 41.20, 55.0];

/// Pick an index into a table of `len` entries that differs from `current`.
pub fn pick_other<R: rand::Rng + ?Sized>(rng: &mut R, len: usize, current: usize) -> usize {
    if len < 2 {
        return 0;
    }
    let offset = rng.random_range(1..len);
    (current + offset) % len
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tables_are_populated() {
        assert!(PROGRESSIONS.len() >= 2);
        assert!(SCALES.len() >= 2);
        for p in PROGRESSIONS {
            assert!(!p.chords.is_empty(), "{} has no chords", p.name);
            assert!(p.chords.iter().all(|c| !c.is_empty()));
        }
        for s in SCALES {
            assert!(s.notes.iter().all(|&f| f > 20.0 && f < 20_000.0));
        }
        assert!(!BELL_BASES.is_empty());
        assert!(!BELL_PARTIALS.is_empty());
    }

    #[test]
    fn test_pick_other_never_repeats() {
        let mut rng = StdRng::seed_from_u64(11);
        for current in 0..4 {
            for _ in 0..50 {
                let next = pick_other(&mut rng, 4, current);
                assert_ne!(next, current);
                assert!(next < 4);
            }
        }
        assert_eq!(pick_other(&mut rng, 1, 0), 0);
    }
}
