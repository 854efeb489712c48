//! Audio output backends
//!
//! A backend owns device enumeration and the platform callback thread. The
//! engine hands it an [`AudioSink`] on open and gets back an
//! [`OutputStream`] whose lifetime is the lifetime of the callback.
//!
//! - [`CpalBackend`] drives a real output device through cpal
//! - [`ManualBackend`] has no device thread; the host pulls audio itself
//!   (offline rendering, tests)

mod cpal;
mod manual;
mod reblock;

pub use self::cpal::CpalBackend;
pub use self::manual::{ManualBackend, ManualStream};
pub use self::reblock::Reblocker;

use crate::error::AudioError;
use crate::sink::AudioSink;

/// Selector value that disables audio output entirely
pub const DEVICE_NONE: &str = "none";

/// An output device as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// What the engine asks the backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest<'a> {
    /// Device name, or `None` for the platform default
    pub device: Option<&'a str>,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames_per_buffer: usize,
}

/// A running output stream; dropping it stops the callback
pub trait OutputStream {
    /// Rate the sink is drained at; sources render at this rate
    fn sample_rate(&self) -> u32;

    /// Rate the hardware runs at, when the stream resamples on the way out
    fn device_sample_rate(&self) -> u32 {
        self.sample_rate()
    }

    /// Name of the device the stream was opened on
    fn device_name(&self) -> &str;

    /// Stop invoking the sink; no callback runs after this returns
    fn pause(&mut self) -> Result<(), AudioError>;
}

/// Device enumeration and stream creation
pub trait AudioBackend {
    /// List output devices (side-effect free from the caller's view)
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, AudioError>;

    /// Open a stream that feeds `sink` from the device callback
    fn open_stream(
        &self,
        request: &StreamRequest<'_>,
        sink: AudioSink,
    ) -> Result<Box<dyn OutputStream>, AudioError>;
}

/// Build the error for a named device that does not exist
pub(crate) fn device_not_found(requested: &str, devices: &[DeviceInfo]) -> AudioError {
    AudioError::DeviceNotFound {
        requested: requested.to_string(),
        available: devices.iter().map(|d| d.name.clone()).collect(),
    }
}
