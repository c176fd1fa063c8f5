//! Offline rendering to a 16-bit stereo WAV file.

use anyhow::{Context, Result};
use stardrift_core::{AmbientEngine, Config};
use std::path::Path;
use std::time::Duration;

const CHUNK_FRAMES: usize = 4096;

/// What a render produced.
#[derive(Debug, Clone, Copy)]
pub struct RenderSummary {
    pub frames: u64,
    pub seconds: f64,
    pub peak: f32,
}

/// Start an engine, render `duration` of it into `output`, then stop it.
pub fn render_to_file(config: &Config, output: &Path, duration: Duration) -> Result<RenderSummary> {
    log::info!("Stardrift Render");
    log::info!("Output:   {}", output.display());
    log::info!("Duration: {}", humantime::format_duration(duration));

    let sample_rate = config.engine.sample_rate;
    let mut engine = AmbientEngine::new(config.clone());
    engine
        .start(config.engine.volume)
        .context("Failed to start ambient engine")?;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output, spec)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let total = (duration.as_secs_f64() * sample_rate as f64).round() as u64;
    let mut remaining = total;
    let mut buffer = vec![0.0f32; CHUNK_FRAMES * 2];
    let mut peak = 0.0f32;
    while remaining > 0 {
        let frames = remaining.min(CHUNK_FRAMES as u64) as usize;
        let block = &mut buffer[..frames * 2];
        engine.render(block);
        for &sample in block.iter() {
            peak = peak.max(sample.abs());
            writer.write_sample(to_i16(sample))?;
        }
        remaining -= frames as u64;
    }

    if let Some(teardown) = engine.stop() {
        log::debug!("Render teardown: {:?}", teardown);
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    let summary = RenderSummary {
        frames: total,
        seconds: total as f64 / sample_rate as f64,
        peak,
    };
    log::info!("Render complete: {} frames, peak {:.3}", summary.frames, summary.peak);
    Ok(summary)
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Config {
        let mut config = Config::default();
        config.engine.seed = Some(11);
        config.engine.sample_rate = 22_050;
        config
    }

    #[test]
    fn test_render_writes_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let summary = render_to_file(&seeded(), &path, Duration::from_secs(3)).unwrap();
        assert_eq!(summary.frames, 3 * 22_050);
        assert!(summary.peak > 0.0 && summary.peak <= 1.0);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len() as u64, summary.frames * 2);
    }

    #[test]
    fn test_seeded_renders_match() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        render_to_file(&seeded(), &a, Duration::from_secs(2)).unwrap();
        render_to_file(&seeded(), &b, Duration::from_secs(2)).unwrap();
        assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }

    #[test]
    fn test_sample_conversion_saturates() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.5), i16::MAX);
        assert_eq!(to_i16(-1.5), -i16::MAX);
    }
}
