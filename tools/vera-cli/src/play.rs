//! Play command - stream demonstration tones from a paced CPU loop

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;
use vera_audio_core::{AudioEngine, AudioError, config};

use crate::devices::print_device_names;
use crate::tone::demo_sources;

/// Commander X16 CPU clock
pub const CPU_CLOCK_HZ: u64 = 8_000_000;

/// How often the emulated CPU catches up with wall time
const STEP: Duration = Duration::from_millis(2);

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    /// Output device name, or "none" to disable audio (overrides the config file)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Number of frame buffers in the output ring, 3-1024 (overrides the config file)
    #[arg(short, long)]
    pub buffers: Option<usize>,

    /// Playback length in seconds
    #[arg(short, long, default_value_t = 3.0)]
    pub seconds: f64,

    /// Base tone frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    pub freq: f32,
}

/// Execute the play command
pub fn execute(args: PlayArgs) -> Result<()> {
    let mut settings = config::load().audio;
    if let Some(device) = args.device {
        settings.device = Some(device);
    }
    if let Some(buffers) = args.buffers {
        settings.buffer_count = buffers;
    }

    let mut engine = AudioEngine::new(demo_sources(args.freq));
    if let Err(err) = engine.open_with_config(&settings) {
        if let AudioError::DeviceNotFound { available, .. } = &err {
            print_device_names(available);
        }
        return Err(err).context("Failed to open audio output");
    }

    if !engine.is_open() {
        println!("Audio output is disabled.");
        return Ok(());
    }

    println!(
        "Playing on {} at {} Hz with {} buffers",
        engine.device_name().unwrap_or("default device"),
        engine.device_sample_rate().unwrap_or_default(),
        engine.buffer_count().unwrap_or_default(),
    );

    let duration = Duration::from_secs_f64(args.seconds.max(0.0));
    let start = Instant::now();
    let mut emulated = 0u64;
    loop {
        let elapsed = start.elapsed().min(duration);
        let target = cycles_at(elapsed);
        engine.advance(target - emulated);
        emulated = target;
        if elapsed >= duration {
            break;
        }
        thread::sleep(STEP);
    }

    let stats = engine.stats();
    engine.close();

    info!(
        mixed = stats.buffers_mixed,
        played = stats.buffers_played,
        dropped = stats.buffers_dropped,
        underruns = stats.underruns,
        "Playback finished"
    );
    println!(
        "Mixed {} buffers, played {}, dropped {}, underruns {}",
        stats.buffers_mixed, stats.buffers_played, stats.buffers_dropped, stats.underruns
    );
    Ok(())
}

/// CPU cycles the emulated machine has run after `elapsed` wall time
pub fn cycles_at(elapsed: Duration) -> u64 {
    (elapsed.as_nanos() * CPU_CLOCK_HZ as u128 / 1_000_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_at() {
        assert_eq!(cycles_at(Duration::ZERO), 0);
        assert_eq!(cycles_at(Duration::from_secs(1)), CPU_CLOCK_HZ);
        assert_eq!(cycles_at(Duration::from_millis(2)), 16_000);
        assert_eq!(cycles_at(Duration::from_nanos(125)), 1);
    }

    #[test]
    fn test_cycles_are_monotonic() {
        let a = cycles_at(Duration::from_micros(1_234));
        let b = cycles_at(Duration::from_micros(1_235));
        assert!(b >= a);
    }
}
