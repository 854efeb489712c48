//! Render command - run the audio path offline into a WAV file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use hound::{SampleFormat, WavSpec, WavWriter};
use vera_audio_core::{AudioEngine, FRAMES_PER_BUFFER, MAX_BUFFER_COUNT, ManualBackend};

use crate::play::CPU_CLOCK_HZ;
use crate::tone::demo_sources;

/// Emulated CPU cycles run between drains of the ring
const CHUNK_CYCLES: u64 = CPU_CLOCK_HZ / 500;

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    pub output: PathBuf,

    /// Length of emulated time to render, in seconds
    #[arg(short, long, default_value_t = 2.0)]
    pub seconds: f64,

    /// Base tone frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    pub freq: f32,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let frames = render_wav(&args.output, args.seconds, args.freq)?;
    println!("Wrote {} frames to {}", frames, args.output.display());
    Ok(())
}

/// Run `seconds` of emulated CPU time through the engine and write every
/// mixed buffer to `path`. Returns the number of stereo frames written.
pub fn render_wav(path: &Path, seconds: f64, freq: f32) -> Result<usize> {
    let backend = ManualBackend::new();
    let mut engine = AudioEngine::with_backend(backend.clone(), demo_sources(freq));
    engine
        .open(None, MAX_BUFFER_COUNT)
        .context("Failed to open offline output")?;
    let sample_rate = engine
        .sample_rate()
        .context("Offline output reported no sample rate")?;

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let total_cycles = (seconds.max(0.0) * CPU_CLOCK_HZ as f64) as u64;
    let mut block = vec![0i16; FRAMES_PER_BUFFER * 2];
    let mut remaining = total_cycles;
    let mut written = 0usize;

    while remaining > 0 {
        let step = remaining.min(CHUNK_CYCLES);
        engine.advance(step);
        remaining -= step;

        for _ in 0..engine.stats().buffered {
            if !backend.pull_interleaved(&mut block) {
                break;
            }
            for &sample in &block {
                writer.write_sample(sample)?;
            }
            written += FRAMES_PER_BUFFER;
        }
    }

    engine.close();
    writer.finalize().context("Failed to finish WAV file")?;
    Ok(written)
}
