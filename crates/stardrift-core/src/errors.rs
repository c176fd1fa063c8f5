//! Error types for the ambient engine.

use stardrift_dsp::SynthError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while driving the ambient engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A synthesis context could not be acquired. Not retried.
    #[error("Synthesis context unavailable: {0}")]
    ContextUnavailable(String),

    /// The synthesis graph rejected an operation.
    #[error("Synthesis error: {0}")]
    Synth(#[from] SynthError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
