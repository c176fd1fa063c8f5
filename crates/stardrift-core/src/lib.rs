//! Stardrift Core - the layered procedural ambient engine.
//!
//! This crate turns a [`stardrift_dsp`] synthesis context into an endless,
//! slowly evolving space ambience:
//!
//! - **Engine** - [`AmbientEngine`] start/stop/volume lifecycle and rendering
//! - **Session** - the per-start bundle of context, master gain and tasks
//! - **Generators** - eight independently timed layers (drone, pad, arpeggio,
//!   sparkles, bass, sweeps, bells, noise texture)
//! - **Scheduler** - repeating tasks with cooperative cancellation
//! - **Control** - toggle/slider state that produces engine [`Command`]s
//! - **Config** - TOML configuration
//!
//! # Architecture
//!
//! Everything is single-threaded and driven by rendered frames. Generator
//! tasks run on block boundaries of the session clock, so a session rendered
//! offline with a fixed seed is fully reproducible.
//!
//! ```
//! use stardrift_core::{AmbientEngine, Config};
//!
//! let mut config = Config::default();
//! config.engine.seed = Some(7);
//! let mut engine = AmbientEngine::new(config);
//! engine.start(0.3).unwrap();
//!
//! let mut out = vec![0.0f32; 2 * 48_000];
//! engine.render(&mut out);
//! engine.stop();
//! ```

pub mod config;
pub mod control;
pub mod engine;
pub mod errors;
pub mod generators;
pub mod scheduler;
pub mod session;
pub mod tables;

pub use config::{Config, EngineSettings, LayerSettings};
pub use control::{Command, SoundToggle};
pub use engine::{AmbientEngine, ContextFactory};
pub use errors::{EngineError, Result};
pub use generators::{Generator, Layer};
pub use scheduler::{CancellationToken, TaskSet};
pub use session::{Session, Teardown};

pub use stardrift_dsp;
