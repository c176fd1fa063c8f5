//! Stardrift CLI - the `stardrift` command.
//!
//! Plays the layered ambient engine live on the default audio device, or
//! renders it offline to a WAV file.
//!
//! # Architecture
//!
//! - **stardrift-dsp**: synthesis graph, params, filters, noise
//! - **stardrift-core**: ambient engine, generators, scheduler, config

mod player;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stardrift_core::tables::{BELL_BASES, BELL_PARTIALS, PROGRESSIONS, SCALES};
use stardrift_core::{Config, Layer};
use std::path::{Path, PathBuf};

/// Stardrift - endless procedural space ambience
#[derive(Parser, Debug)]
#[command(name = "stardrift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Layered procedural ambient sound for the terminal", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play live on the default output device
    Play {
        /// Master volume (0.0 - 1.0)
        #[arg(short, long)]
        volume: Option<f32>,

        /// Stop after this long (e.g. "90s", "5m"); plays until quit otherwise
        #[arg(short, long)]
        duration: Option<humantime::Duration>,

        /// Random seed for a reproducible session
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Render offline to a WAV file
    Render {
        /// Output WAV file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Length of the render
        #[arg(short, long, default_value = "60s")]
        duration: humantime::Duration,

        /// Master volume (0.0 - 1.0)
        #[arg(short, long)]
        volume: Option<f32>,

        /// Random seed for a reproducible render
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output sample rate in Hz
        #[arg(short = 'r', long)]
        sample_rate: Option<u32>,
    },

    /// List the generator layers and their harmony tables
    Layers,

    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the default config file location
    ConfigPath,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    match args.command {
        Commands::Play {
            volume,
            duration,
            seed,
        } => {
            let mut config = load_config(args.config.as_deref())?;
            apply_overrides(&mut config, volume, seed, None)?;
            player::play(config, duration.map(Into::into))
        }
        Commands::Render {
            output,
            duration,
            volume,
            seed,
            sample_rate,
        } => {
            let mut config = load_config(args.config.as_deref())?;
            apply_overrides(&mut config, volume, seed, sample_rate)?;
            let summary = render::render_to_file(&config, &output, duration.into())?;
            println!(
                "Wrote {} ({:.1}s, peak {:.3})",
                output.display(),
                summary.seconds,
                summary.peak
            );
            Ok(())
        }
        Commands::Layers => {
            print_layers();
            Ok(())
        }
        Commands::Init { force } => init_config(args.config.as_deref(), force),
        Commands::ConfigPath => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

/// Load from an explicit path, or fall back to the default location and defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(Config::load_or_default()),
    }
}

fn apply_overrides(
    config: &mut Config,
    volume: Option<f32>,
    seed: Option<u64>,
    sample_rate: Option<u32>,
) -> Result<()> {
    if let Some(volume) = volume {
        config.engine.volume = volume;
    }
    if seed.is_some() {
        config.engine.seed = seed;
    }
    if let Some(sample_rate) = sample_rate {
        config.engine.sample_rate = sample_rate;
    }
    config.validate().context("Invalid command line override")?;
    Ok(())
}

fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    Config::write_default_config_file(&path)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn print_layers() {
    println!("Layers:");
    for layer in Layer::ALL {
        println!("  {:<10} {}", layer, layer.description());
    }

    println!();
    println!("Progressions:");
    for progression in PROGRESSIONS {
        println!("  {}", progression.name);
    }

    println!();
    println!("Scales:");
    for scale in SCALES {
        println!("  {:<20} {} notes", scale.name, scale.notes.len());
    }

    println!();
    println!(
        "Bells: {} strike notes, {} partials",
        BELL_BASES.len(),
        BELL_PARTIALS.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render() {
        let args = Args::try_parse_from([
            "stardrift", "render", "-o", "out.wav", "-d", "2m", "--seed", "5",
        ])
        .unwrap();
        match args.command {
            Commands::Render {
                output,
                duration,
                seed,
                ..
            } => {
                assert_eq!(output, PathBuf::from("out.wav"));
                assert_eq!(std::time::Duration::from(duration).as_secs(), 120);
                assert_eq!(seed, Some(5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = Config::default();
        apply_overrides(&mut config, Some(0.8), Some(3), Some(44_100)).unwrap();
        assert_eq!(config.engine.volume, 0.8);
        assert_eq!(config.engine.seed, Some(3));
        assert_eq!(config.engine.sample_rate, 44_100);
        assert!(apply_overrides(&mut config, Some(3.0), None, None).is_err());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        init_config(Some(&path), false).unwrap();
        assert!(init_config(Some(&path), false).is_err());
        init_config(Some(&path), true).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Config::default());
    }
}
