//! Configuration file support for stardrift
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/stardrift/config.toml`
//! - macOS: `~/Library/Application Support/stardrift/config.toml`
//! - Windows: `%APPDATA%\stardrift\config.toml`

use crate::errors::{EngineError, Result};
use crate::generators::Layer;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use stardrift_dsp::ContextOptions;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default master volume, matching the page's slider.
pub const DEFAULT_VOLUME: f32 = 0.3;

/// Default master volume ramp for `set_volume`.
pub const DEFAULT_VOLUME_RAMP_MS: u64 = 100;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine configuration
    pub engine: EngineSettings,
    /// Which generator layers play
    pub layers: LayerSettings,
}

/// Rendering and session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Frames rendered between scheduler checks
    pub block_size: usize,
    /// Initial master volume (0.0 - 1.0)
    pub volume: f32,
    /// Master volume ramp time in milliseconds
    pub volume_ramp_ms: u64,
    /// Seed for deterministic sessions; random when absent
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let options = ContextOptions::default();
        Self {
            sample_rate: options.sample_rate,
            block_size: options.block_size,
            volume: DEFAULT_VOLUME,
            volume_ramp_ms: DEFAULT_VOLUME_RAMP_MS,
            seed: None,
        }
    }
}

impl EngineSettings {
    /// Context options for a new session.
    pub fn context_options(&self) -> ContextOptions {
        ContextOptions::new(self.sample_rate).with_block_size(self.block_size)
    }

    /// The master volume ramp as a duration.
    pub fn volume_ramp(&self) -> Duration {
        Duration::from_millis(self.volume_ramp_ms)
    }
}

/// Per-layer on/off switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSettings {
    pub drone: bool,
    pub pad: bool,
    pub arpeggio: bool,
    pub sparkle: bool,
    pub bass: bool,
    pub sweep: bool,
    pub bells: bool,
    pub texture: bool,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            drone: true,
            pad: true,
            arpeggio: true,
            sparkle: true,
            bass: true,
            sweep: true,
            bells: true,
            texture: true,
        }
    }
}

impl LayerSettings {
    /// Whether `layer` is switched on.
    pub fn is_enabled(&self, layer: Layer) -> bool {
        match layer {
            Layer::Drone => self.drone,
            Layer::Pad => self.pad,
            Layer::Arpeggio => self.arpeggio,
            Layer::Sparkle => self.sparkle,
            Layer::Bass => self.bass,
            Layer::Sweep => self.sweep,
            Layer::Bells => self.bells,
            Layer::Texture => self.texture,
        }
    }

    /// Enabled layers in launch order.
    pub fn enabled(&self) -> Vec<Layer> {
        Layer::ALL
            .into_iter()
            .filter(|&l| self.is_enabled(l))
            .collect()
    }

    /// Only the given layers switched on.
    pub fn only(layers: &[Layer]) -> Self {
        Self {
            drone: layers.contains(&Layer::Drone),
            pad: layers.contains(&Layer::Pad),
            arpeggio: layers.contains(&Layer::Arpeggio),
            sparkle: layers.contains(&Layer::Sparkle),
            bass: layers.contains(&Layer::Bass),
            sweep: layers.contains(&Layer::Sweep),
            bells: layers.contains(&Layer::Bells),
            texture: layers.contains(&Layer::Texture),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.engine.volume) {
            return Err(EngineError::Config(format!(
                "volume must be within 0.0-1.0, got {}",
                self.engine.volume
            )));
        }
        if self.engine.block_size == 0 {
            return Err(EngineError::Config("block_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(EngineError::Config(format!(
                "Config file not found at {:?}",
                path
            )))
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "stardrift") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(EngineError::Config(
                "Could not determine config directory".to_string(),
            ))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config_file(&path)?;
        Ok(path)
    }

    /// Write the commented default config to `path`
    pub fn write_default_config_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }
}

const DEFAULT_CONFIG_TOML: &str = r#"# stardrift configuration file

[engine]
# Output sample rate in Hz (live playback uses the device rate instead)
sample_rate = 48000

# Frames rendered between scheduler checks
block_size = 128

# Initial master volume (0.0 - 1.0)
volume = 0.3

# How long volume changes take to settle, in milliseconds
volume_ramp_ms = 100

# Fix the random seed for reproducible sessions
# seed = 42

[layers]
drone = true
pad = true
arpeggio = true
sparkle = true
bass = true
sweep = true
bells = true
texture = true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file_parses_to_defaults() {
        let parsed = Config::from_toml_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed = Config::from_toml_str(
            r#"
            [engine]
            seed = 9

            [layers]
            sweep = false
            "#,
        )
        .unwrap();
        assert_eq!(parsed.engine.seed, Some(9));
        assert_eq!(parsed.engine.sample_rate, 48_000);
        assert!(!parsed.layers.sweep);
        assert!(parsed.layers.drone);
        assert_eq!(parsed.layers.enabled().len(), 7);
    }

    #[test]
    fn test_invalid_volume_rejected() {
        let err = Config::from_toml_str("[engine]\nvolume = 1.5\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = Config::from_toml_str("[engine\n").unwrap_err();
        assert!(matches!(err, EngineError::TomlParse(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.engine.volume = 0.6;
        config.layers = LayerSettings::only(&[Layer::Drone, Layer::Bells]);
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_write_default_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::write_default_config_file(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_settings_conversions() {
        let settings = EngineSettings::default();
        assert_eq!(settings.context_options(), ContextOptions::default());
        assert_eq!(settings.volume_ramp(), Duration::from_millis(100));
    }
}
