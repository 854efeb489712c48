//! Config command - show or update the saved audio settings

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use vera_audio_core::config::{self, Config};
use vera_audio_core::{MAX_BUFFER_COUNT, MIN_BUFFER_COUNT};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Output device name, or "none" to disable audio
    #[arg(short, long)]
    pub device: Option<String>,

    /// Use the system default output device
    #[arg(long, conflicts_with = "device")]
    pub default_device: bool,

    /// Number of frame buffers in the output ring
    #[arg(short, long)]
    pub buffers: Option<usize>,

    /// Write the result back to the config file
    #[arg(long)]
    pub save: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let path = config::config_path().context("No config directory on this platform")?;
    let mut cfg = config::load_from(&path);
    let changed = apply(&mut cfg, &args);

    print_config(&cfg, &path);

    if args.save {
        config::save_to(&cfg, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved.");
    } else if changed {
        println!("Not saved; pass --save to keep these settings.");
    }
    Ok(())
}

/// Apply command-line overrides, returning whether anything changed
fn apply(cfg: &mut Config, args: &ConfigArgs) -> bool {
    let before = cfg.clone();
    if let Some(device) = &args.device {
        cfg.audio.device = Some(device.clone());
    }
    if args.default_device {
        cfg.audio.device = None;
    }
    if let Some(buffers) = args.buffers {
        cfg.audio.buffer_count = buffers;
    }
    *cfg != before
}

fn print_config(cfg: &Config, path: &Path) {
    let audio = &cfg.audio;
    println!("Config file: {}", path.display());
    println!(
        "  device:       {}",
        audio.device.as_deref().unwrap_or("(system default)")
    );
    if audio.effective_buffer_count() == audio.buffer_count {
        println!("  buffer_count: {}", audio.buffer_count);
    } else {
        println!(
            "  buffer_count: {} (used as {}, allowed {}-{})",
            audio.buffer_count,
            audio.effective_buffer_count(),
            MIN_BUFFER_COUNT,
            MAX_BUFFER_COUNT
        );
    }
    if audio.is_disabled() {
        println!("  audio output is disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(device: Option<&str>, default_device: bool, buffers: Option<usize>) -> ConfigArgs {
        ConfigArgs {
            device: device.map(str::to_string),
            default_device,
            buffers,
            save: false,
        }
    }

    #[test]
    fn test_apply_nothing() {
        let mut cfg = Config::default();
        assert!(!apply(&mut cfg, &args(None, false, None)));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_apply_overrides() {
        let mut cfg = Config::default();
        assert!(apply(&mut cfg, &args(Some("USB DAC"), false, Some(16))));
        assert_eq!(cfg.audio.device.as_deref(), Some("USB DAC"));
        assert_eq!(cfg.audio.buffer_count, 16);
    }

    #[test]
    fn test_apply_default_device_clears_name() {
        let mut cfg = Config::default();
        cfg.audio.device = Some("USB DAC".into());
        assert!(apply(&mut cfg, &args(None, true, None)));
        assert_eq!(cfg.audio.device, None);
    }

    #[test]
    fn test_saved_overrides_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = config::load_from(&path);
        apply(&mut cfg, &args(Some("none"), false, Some(4)));
        config::save_to(&cfg, &path).unwrap();

        let loaded = config::load_from(&path);
        assert_eq!(loaded, cfg);
        assert!(loaded.audio.is_disabled());
    }
}
