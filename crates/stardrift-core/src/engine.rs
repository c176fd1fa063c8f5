//! The ambient engine: start/stop/volume lifecycle around a [`Session`].
//!
//! The engine is single-threaded and frame driven. Whoever owns it (an audio
//! callback, an offline renderer, a test) calls [`AmbientEngine::render`];
//! due generator tasks run on block boundaries of the session's context clock
//! before each block is rendered.

use crate::config::Config;
use crate::control::Command;
use crate::errors::{EngineError, Result};
use crate::session::{Session, Teardown};
use rand::rngs::StdRng;
use rand::SeedableRng;
use stardrift_dsp::{ContextOptions, SynthContext};
use std::time::Duration;

/// Source of synthesis contexts, one per session.
pub trait ContextFactory: Send {
    fn create_context(&mut self) -> stardrift_dsp::Result<SynthContext>;
}

impl ContextFactory for ContextOptions {
    fn create_context(&mut self) -> stardrift_dsp::Result<SynthContext> {
        SynthContext::new(*self)
    }
}

/// Layered procedural ambient sound, switched on and off at runtime.
pub struct AmbientEngine {
    config: Config,
    factory: Box<dyn ContextFactory>,
    session: Option<Session>,
    sessions_started: u64,
}

impl std::fmt::Debug for AmbientEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbientEngine")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("sessions_started", &self.sessions_started)
            .finish_non_exhaustive()
    }
}

impl AmbientEngine {
    /// Create an idle engine rendering at the configured sample rate.
    pub fn new(config: Config) -> Self {
        let options = config.engine.context_options();
        Self::with_factory(config, options)
    }

    /// Create an idle engine that acquires contexts from `factory`.
    pub fn with_factory(config: Config, factory: impl ContextFactory + 'static) -> Self {
        Self {
            config,
            factory: Box::new(factory),
            session: None,
            sessions_started: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Start playing at `volume` (clamped to 0.0-1.0). Does nothing if already playing.
    pub fn start(&mut self, volume: f32) -> Result<()> {
        if self.session.is_some() {
            log::debug!("Engine already running");
            return Ok(());
        }
        let ctx = self
            .factory
            .create_context()
            .map_err(|e| EngineError::ContextUnavailable(e.to_string()))?;

        let rng = match self.config.engine.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.sessions_started)),
            None => StdRng::from_os_rng(),
        };
        let layers = self.config.layers.enabled();
        let session = Session::open(ctx, clamp_volume(volume), &layers, rng)?;
        self.sessions_started += 1;

        log::info!(
            "Ambient session started at volume {:.2} with {} layers",
            session.volume(),
            layers.len()
        );
        self.session = Some(session);
        Ok(())
    }

    /// Stop playing and release every resource. Returns `None` when idle.
    pub fn stop(&mut self) -> Option<Teardown> {
        let session = self.session.take()?;
        let teardown = session.shutdown();
        log::info!(
            "Ambient session stopped ({} tasks cancelled, {} sources stopped, {} already ended)",
            teardown.tasks_cancelled,
            teardown.handles_stopped,
            teardown.already_stopped
        );
        Some(teardown)
    }

    /// Glide the master volume to `volume` (clamped to 0.0-1.0).
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        let ramp = self.config.engine.volume_ramp().as_secs_f64();
        match self.session.as_mut() {
            Some(session) => session.ramp_volume(clamp_volume(volume), ramp),
            None => Ok(()),
        }
    }

    /// Apply a control command.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Start { volume } => self.start(volume),
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::SetVolume(volume) => self.set_volume(volume),
        }
    }

    /// Fill `out` with interleaved stereo samples. Silence when idle.
    pub fn render(&mut self, out: &mut [f32]) {
        let Some(session) = self.session.as_mut() else {
            out.fill(0.0);
            return;
        };
        let block = session.context().block_size() * 2;
        for chunk in out.chunks_mut(block) {
            session.run_due();
            session.context_mut().render(chunk);
        }
    }

    /// Render and discard `duration` of audio.
    pub fn advance(&mut self, duration: Duration) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let sample_rate = session.context().sample_rate() as f64;
        let mut frames = (duration.as_secs_f64() * sample_rate).round() as usize;
        let mut scratch = vec![0.0f32; 2 * 4096];
        while frames > 0 {
            let n = frames.min(4096);
            self.render(&mut scratch[..n * 2]);
            frames -= n;
        }
    }

    /// Context time of the running session, in seconds.
    pub fn current_time(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.context().current_time())
    }

    pub fn sample_rate(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(self.config.engine.sample_rate, |s| s.context().sample_rate())
    }
}

impl Drop for AmbientEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
