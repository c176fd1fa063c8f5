//! Play/pause toggle and volume slider state.
//!
//! [`SoundToggle`] holds what a user interface shows and turns user actions
//! into [`Command`]s for the engine. It never touches the engine itself, so
//! it can live on a different thread from the one rendering audio.

use crate::config::DEFAULT_VOLUME;

/// Slider step for [`SoundToggle::step_volume`].
pub const VOLUME_STEP: f32 = 0.1;

/// An instruction for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start { volume: f32 },
    Stop,
    SetVolume(f32),
}

/// UI-side playback state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundToggle {
    playing: bool,
    volume: f32,
}

impl Default for SoundToggle {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

impl SoundToggle {
    pub fn new(volume: f32) -> Self {
        Self {
            playing: false,
            volume: clamp(volume),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Flip between playing and stopped.
    pub fn toggle(&mut self) -> Command {
        self.playing = !self.playing;
        if self.playing {
            Command::Start {
                volume: self.volume,
            }
        } else {
            Command::Stop
        }
    }

    /// Move the slider to `volume`.
    pub fn set_volume(&mut self, volume: f32) -> Command {
        self.volume = clamp(volume);
        Command::SetVolume(self.volume)
    }

    /// Move the slider by `steps` increments of [`VOLUME_STEP`].
    pub fn step_volume(&mut self, steps: i32) -> Command {
        let raw = self.volume + steps as f32 * VOLUME_STEP;
        // Snap to the slider grid so repeated steps don't drift.
        self.set_volume((raw / VOLUME_STEP).round() * VOLUME_STEP)
    }

    /// Re-align with the engine, e.g. after a start that failed.
    pub fn sync(&mut self, playing: bool) {
        self.playing = playing;
    }
}

fn clamp(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
