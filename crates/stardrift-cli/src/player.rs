//! Live playback on the default output device.
//!
//! The engine is moved into the cpal callback and owned by the audio thread.
//! The main thread keeps a [`SoundToggle`] and sends [`Command`]s over a
//! channel that the callback drains before rendering each buffer. Results
//! travel back over a second channel.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use stardrift_core::{AmbientEngine, Command, Config, SoundToggle};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_millis(100);

/// Reported by the audio thread after applying a command.
#[derive(Debug, Clone, PartialEq)]
enum PlayerEvent {
    Started,
    Stopped,
    Failed(String),
}

/// A parsed line of keyboard input.
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Send(Command),
    Quit,
    Unknown(String),
}

pub fn play(mut config: Config, duration: Option<Duration>) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("No output device available")?;
    let supported = device
        .default_output_config()
        .context("Failed to query default output config")?;
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();

    // Render at the device rate.
    config.engine.sample_rate = stream_config.sample_rate.0;
    log::info!(
        "Output: {} ({} Hz, {} channels, {:?})",
        device.name().unwrap_or_else(|_| "unknown".to_string()),
        stream_config.sample_rate.0,
        stream_config.channels,
        sample_format
    );

    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let engine = AmbientEngine::new(config.clone());

    let stream = match sample_format {
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(&device, &stream_config, engine, command_rx, event_tx)
        }
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(&device, &stream_config, engine, command_rx, event_tx)
        }
        cpal::SampleFormat::U16 => {
            build_stream::<u16>(&device, &stream_config, engine, command_rx, event_tx)
        }
        other => anyhow::bail!("Unsupported sample format: {:?}", other),
    }?;
    stream.play().context("Failed to start audio stream")?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("Failed to set Ctrl-C handler")?;

    let lines = spawn_stdin_reader();
    let mut toggle = SoundToggle::new(config.engine.volume);
    command_tx.send(toggle.toggle())?;
    println!("Controls: [enter]/p toggle, +/- volume, v <0-1> set volume, q quit");

    let deadline = duration.map(|d| Instant::now() + d);
    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            log::info!("Duration reached");
            break;
        }

        match lines.recv_timeout(POLL) {
            Ok(line) => match parse_input(&line, &mut toggle) {
                Input::Send(command) => {
                    log::debug!("Sending {:?}", command);
                    command_tx.send(command)?;
                }
                Input::Quit => break,
                Input::Unknown(line) => println!("Unknown input: {:?}", line),
            },
            Err(RecvTimeoutError::Timeout) => {}
            // Stdin closed; keep playing until Ctrl-C or the deadline.
            Err(RecvTimeoutError::Disconnected) => std::thread::sleep(POLL),
        }

        for event in event_rx.try_iter() {
            match event {
                PlayerEvent::Started => println!("Playing (volume {:.1})", toggle.volume()),
                PlayerEvent::Stopped => println!("Stopped"),
                PlayerEvent::Failed(e) => {
                    log::error!("{}", e);
                    toggle.sync(false);
                }
            }
        }
    }

    // The callback owns the engine; stop it there so teardown is logged,
    // then give the device one buffer to drain.
    let _ = command_tx.send(Command::Stop);
    std::thread::sleep(POLL);
    drop(stream);
    log::info!("Goodbye");
    Ok(())
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: AmbientEngine,
    commands: Receiver<Command>,
    events: Sender<PlayerEvent>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut stereo: Vec<f32> = Vec::new();
    let err_fn = |err: cpal::StreamError| log::error!("Audio stream error: {}", err);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(command) = commands.try_recv() {
                let event = match engine.apply(command) {
                    Ok(()) => match command {
                        Command::Start { .. } => Some(PlayerEvent::Started),
                        Command::Stop => Some(PlayerEvent::Stopped),
                        Command::SetVolume(_) => None,
                    },
                    Err(e) => Some(PlayerEvent::Failed(e.to_string())),
                };
                if let Some(event) = event {
                    let _ = events.send(event);
                }
            }

            let frames = data.len() / channels.max(1);
            stereo.resize(frames * 2, 0.0);
            engine.render(&mut stereo);
            write_frames(&stereo, channels, data);
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

/// Spread interleaved stereo onto a device layout. Channel 0 is left,
/// channel 1 right; mono and extra channels get the mid signal.
fn write_frames<T: FromSample<f32>>(stereo: &[f32], channels: usize, out: &mut [T]) {
    if channels == 0 {
        return;
    }
    for (frame, lr) in out.chunks_mut(channels).zip(stereo.chunks(2)) {
        let (left, right) = (lr[0], lr.get(1).copied().unwrap_or(lr[0]));
        let mid = (left + right) * 0.5;
        for (ch, sample) in frame.iter_mut().enumerate() {
            let value = match (channels, ch) {
                (1, _) => mid,
                (_, 0) => left,
                (_, 1) => right,
                _ => mid,
            };
            *sample = T::from_sample_(value);
        }
    }
}

fn parse_input(line: &str, toggle: &mut SoundToggle) -> Input {
    let line = line.trim();
    match line {
        "" | "p" => Input::Send(toggle.toggle()),
        "+" => Input::Send(toggle.step_volume(1)),
        "-" => Input::Send(toggle.step_volume(-1)),
        "q" | "quit" => Input::Quit,
        _ => match line.strip_prefix('v').map(str::trim).map(str::parse::<f32>) {
            Some(Ok(volume)) => Input::Send(toggle.set_volume(volume)),
            _ => Input::Unknown(line.to_string()),
        },
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        let mut toggle = SoundToggle::default();
        assert_eq!(
            parse_input("", &mut toggle),
            Input::Send(Command::Start { volume: 0.3 })
        );
        assert_eq!(parse_input("p", &mut toggle), Input::Send(Command::Stop));
        assert!(matches!(
            parse_input("+", &mut toggle),
            Input::Send(Command::SetVolume(v)) if (v - 0.4).abs() < 1e-6
        ));
        assert_eq!(
            parse_input("v 0.75", &mut toggle),
            Input::Send(Command::SetVolume(0.75))
        );
        assert_eq!(
            parse_input("v 9", &mut toggle),
            Input::Send(Command::SetVolume(1.0))
        );
        assert_eq!(parse_input(" q ", &mut toggle), Input::Quit);
        assert_eq!(
            parse_input("vx", &mut toggle),
            Input::Unknown("vx".to_string())
        );
    }

    #[test]
    fn test_write_frames_channel_layouts() {
        let stereo = [0.5, -0.5, 0.2, 0.4];

        let mut two = [0.0f32; 4];
        write_frames(&stereo, 2, &mut two);
        assert_eq!(two, stereo);

        let mut mono = [0.0f32; 2];
        write_frames(&stereo, 1, &mut mono);
        assert!((mono[0] - 0.0).abs() < 1e-6);
        assert!((mono[1] - 0.3).abs() < 1e-6);

        let mut quad = [0.0f32; 8];
        write_frames(&stereo, 4, &mut quad);
        assert_eq!(&quad[..4], &[0.5, -0.5, 0.0, 0.0]);
        assert!((quad[6] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_write_frames_converts_integers() {
        let stereo = [1.0, -1.0];
        let mut out = [0i16; 2];
        write_frames(&stereo, 2, &mut out);
        assert_eq!(out[0], i16::MAX);
        assert!(out[1] <= -i16::MAX);
    }

    #[test]
    fn test_engine_follows_commands_over_channel() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut config = Config::default();
        config.engine.seed = Some(1);
        let mut engine = AmbientEngine::new(config);
        tx.send(Command::Start { volume: 0.5 }).unwrap();
        tx.send(Command::SetVolume(0.2)).unwrap();
        for command in rx.try_iter() {
            engine.apply(command).unwrap();
        }
        assert!(engine.is_running());
        assert_eq!(engine.session().unwrap().volume(), 0.2);
    }
}
