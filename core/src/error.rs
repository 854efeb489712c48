//! Audio engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Cannot allocate audio buffers ({buffers} x {frames} frames)")]
    Allocation { buffers: usize, frames: usize },

    #[error("Audio device '{requested}' not found (available: {})", .available.join(", "))]
    DeviceNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("No default audio output device available")]
    NoDefaultDevice,

    #[error("Cannot resample to the device rate: {0}")]
    Resampler(#[from] rubato::ResamplerConstructionError),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to enumerate audio devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("Failed to query device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("Failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to query supported output configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Failed to pause audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),
}

impl AudioError {
    /// Device names to show the user after a failed open, if any
    pub fn available_devices(&self) -> &[String] {
        match self {
            Self::DeviceNotFound { available, .. } => available,
            _ => &[],
        }
    }
}
