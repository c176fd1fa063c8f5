//! One playing session: a context, its master gain and the generator tasks.

use crate::errors::Result;
use crate::generators::{GenContext, Harmony, Layer};
use crate::scheduler::{CancellationToken, TaskSet, MIN_TASK_DELAY};
use rand::rngs::StdRng;
use stardrift_dsp::{AudioParam, NodeId, ParamKind, SynthContext};

/// What [`Session::shutdown`] released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Pending tasks dropped before their next run.
    pub tasks_cancelled: usize,
    /// Tracked sources stopped.
    pub handles_stopped: usize,
    /// Tracked sources that had already ended or been released.
    pub already_stopped: usize,
    /// Whether a noise source was stopped.
    pub noise_stopped: bool,
}

/// Resources owned by a running engine.
pub struct Session {
    ctx: SynthContext,
    master: NodeId,
    volume: f32,
    token: CancellationToken,
    tasks: TaskSet,
    tracked: Vec<NodeId>,
    noise: Option<NodeId>,
    harmony: Harmony,
    rng: StdRng,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("ctx", &self.ctx)
            .field("volume", &self.volume)
            .field("tasks", &self.tasks)
            .field("tracked", &self.tracked.len())
            .field("harmony", &self.harmony)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create the master gain on `ctx` and launch the given layers.
    ///
    /// A layer whose setup fails is logged and skipped.
    pub(crate) fn open(
        mut ctx: SynthContext,
        volume: f32,
        layers: &[Layer],
        rng: StdRng,
    ) -> Result<Self> {
        let now = ctx.current_time();
        let master = ctx.create_gain();
        let gain = ctx.param_mut(master, ParamKind::Gain)?;
        gain.set_value(volume);
        gain.set_value_at_time(volume, now)?;
        ctx.connect(master, ctx.destination())?;
        ctx.pin(master)?;

        let mut session = Self {
            ctx,
            master,
            volume,
            token: CancellationToken::new(),
            tasks: TaskSet::new(),
            tracked: Vec::new(),
            noise: None,
            harmony: Harmony::default(),
            rng,
        };
        for &layer in layers {
            session.launch(layer);
        }
        Ok(session)
    }

    fn launch(&mut self, layer: Layer) {
        let Self {
            ctx,
            master,
            token,
            tasks,
            tracked,
            noise,
            harmony,
            rng,
            ..
        } = self;
        let now = ctx.current_time();
        let mut generator = layer.generator();
        let mut cx = GenContext::new(ctx, *master, rng, harmony, tracked, noise);
        match generator.start(&mut cx) {
            Ok(Some(delay)) => {
                tasks.spawn(generator, token.clone(), now + delay.max(MIN_TASK_DELAY));
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Could not start {} layer: {}", layer, e);
                return;
            }
        }
        log::debug!("Launched {} layer", layer);
    }

    /// Run every task due at the current context time.
    pub fn run_due(&mut self) -> usize {
        let Self {
            ctx,
            master,
            tasks,
            tracked,
            noise,
            harmony,
            rng,
            ..
        } = self;
        let now = ctx.current_time();
        let mut cx = GenContext::new(ctx, *master, rng, harmony, tracked, noise);
        tasks.run_due(now, &mut cx)
    }

    /// Ramp the master gain from its current value to `volume`.
    pub(crate) fn ramp_volume(&mut self, volume: f32, ramp: f64) -> Result<()> {
        let now = self.ctx.current_time();
        let gain = self.ctx.param_mut(self.master, ParamKind::Gain)?;
        let current = gain.value();
        gain.cancel_scheduled_values(now);
        gain.set_value_at_time(current, now)?;
        gain.linear_ramp_to_value_at_time(volume, now + ramp.max(0.0))?;
        self.volume = volume;
        Ok(())
    }

    /// Release everything: cancel tasks, stop sources, close the context.
    pub fn shutdown(mut self) -> Teardown {
        self.token.cancel();
        let mut teardown = Teardown {
            tasks_cancelled: self.tasks.cancel_all(),
            ..Teardown::default()
        };

        let now = self.ctx.current_time();
        for id in self.tracked.drain(..) {
            match self.ctx.stop(id, now) {
                Ok(()) => teardown.handles_stopped += 1,
                Err(e) => {
                    log::trace!("Ignoring stop of {}: {}", id, e);
                    teardown.already_stopped += 1;
                }
            }
        }
        if let Some(noise) = self.noise.take() {
            match self.ctx.stop(noise, now) {
                Ok(()) => teardown.noise_stopped = true,
                Err(e) => log::trace!("Ignoring stop of noise source {}: {}", noise, e),
            }
        }

        self.ctx.close();
        teardown
    }

    pub fn context(&self) -> &SynthContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SynthContext {
        &mut self.ctx
    }

    /// The master gain node.
    pub fn master(&self) -> NodeId {
        self.master
    }

    /// The master gain's automation.
    pub fn master_gain(&self) -> Result<&AudioParam> {
        Ok(self.ctx.param(self.master, ParamKind::Gain)?)
    }

    /// Target master volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Steady-state sources released on shutdown.
    pub fn tracked_handles(&self) -> &[NodeId] {
        &self.tracked
    }

    pub fn noise_source(&self) -> Option<NodeId> {
        self.noise
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// A clone of the session's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn harmony(&self) -> Harmony {
        self.harmony
    }
}
