//! Configuration management (config.toml)
//!
//! Settings are stored in TOML format in the platform-specific config directory:
//!
//! ```toml
//! [audio]
//! device = "Built-in Output"   # omit for the system default, "none" to disable
//! buffer_count = 8             # clamped to 3..=1024
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ring::clamp_buffer_count;

/// Buffer count used when none is configured
pub const DEFAULT_BUFFER_COUNT: usize = 8;

/// Config file name inside [`config_dir`]
pub const CONFIG_FILE: &str = "config.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Audio output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Output device name (default: system default device)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Frame buffers in the output ring (default: 8, range: 3-1024)
    #[serde(default = "default_buffer_count")]
    pub buffer_count: usize,
}

fn default_buffer_count() -> usize {
    DEFAULT_BUFFER_COUNT
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            buffer_count: default_buffer_count(),
        }
    }
}

impl AudioConfig {
    /// Buffer count after clamping to the supported range
    pub fn effective_buffer_count(&self) -> usize {
        clamp_buffer_count(self.buffer_count)
    }

    /// Whether the configured device disables output
    pub fn is_disabled(&self) -> bool {
        self.device.as_deref() == Some(crate::backend::DEVICE_NONE)
    }
}

impl Config {
    /// Parse a config from TOML text, reporting syntax and type errors
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\VeraAudio\config`
/// On macOS: `~/Library/Application Support/io.vera-audio.VeraAudio`
/// On Linux: `~/.config/VeraAudio`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.vera-audio", "", "VeraAudio")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Full path of the config file, if a config directory exists
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_path()
        .map(|path| load_from(&path))
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path, with the same fallback as [`load`].
pub fn load_from(path: &Path) -> Config {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| Config::from_toml_str(&content).ok())
        .unwrap_or_default()
}

/// Saves the configuration to disk.
///
/// Creates the config directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &Config) -> std::io::Result<()> {
    match config_path() {
        Some(path) => save_to(config, &path),
        None => Ok(()),
    }
}

/// Saves the configuration to an explicit path.
pub fn save_to(config: &Config, path: &Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = config.to_toml_string().map_err(std::io::Error::other)?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audio.device, None);
        assert_eq!(config.audio.buffer_count, DEFAULT_BUFFER_COUNT);
        assert!(!config.audio.is_disabled());
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::from_toml_str("[audio]\ndevice = \"none\"\n").unwrap();
        assert!(config.audio.is_disabled());
        assert_eq!(config.audio.buffer_count, DEFAULT_BUFFER_COUNT);

        let empty = Config::from_toml_str("").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(Config::from_toml_str("[audio]\nbuffer_count = \"lots\"\n").is_err());
    }

    #[test]
    fn test_effective_buffer_count_is_clamped() {
        let mut audio = AudioConfig::default();
        audio.buffer_count = 1;
        assert_eq!(audio.effective_buffer_count(), 3);
        audio.buffer_count = 5000;
        assert_eq!(audio.effective_buffer_count(), 1024);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            audio: AudioConfig {
                device: Some("Speakers".to_string()),
                buffer_count: 16,
            },
        };
        save_to(&config, &path).unwrap();
        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn test_load_falls_back_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "this is not toml [[[").unwrap();
        assert_eq!(load_from(&path), Config::default());
        assert_eq!(load_from(&dir.path().join("missing.toml")), Config::default());
    }
}
