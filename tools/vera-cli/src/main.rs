//! Vera CLI - drive the emulated Commander X16 audio path
//!
//! # Commands
//!
//! - `vera devices` - List audio output devices
//! - `vera play` - Stream demonstration tones to a device from a paced CPU loop
//! - `vera render` - Render demonstration tones offline into a WAV file
//! - `vera config` - Show or update the saved audio settings
//!
//! # Usage
//!
//! ```bash
//! vera devices
//! vera play --seconds 3 --freq 440
//! vera play --device "Built-in Output" --buffers 16
//! vera render tone.wav --seconds 2
//! vera config --buffers 12 --save
//! ```
//!
//! Set `RUST_LOG=debug` for engine lifecycle logging.

mod devices;
mod play;
mod render;
mod settings;
mod tone;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Vera CLI - emulated Commander X16 audio output
#[derive(Parser)]
#[command(name = "vera")]
#[command(about = "Emulated Commander X16 audio output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio output devices
    Devices(devices::DevicesArgs),

    /// Stream demonstration tones to an output device
    Play(play::PlayArgs),

    /// Render demonstration tones into a WAV file
    Render(render::RenderArgs),

    /// Show or update the saved audio settings
    Config(settings::ConfigArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices(args) => devices::execute(args),
        Commands::Play(args) => play::execute(args),
        Commands::Render(args) => render::execute(args),
        Commands::Config(args) => settings::execute(args),
    }
}
