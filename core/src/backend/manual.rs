//! Host-driven output with no device thread
//!
//! The host calls [`ManualBackend::pull`] whenever it wants more audio,
//! standing in for the platform audio driver. Used for offline rendering
//! (e.g. writing WAV files) and for driving the engine deterministically in
//! tests.

use std::sync::{Arc, Mutex, MutexGuard};

use super::reblock::Reblocker;
use super::{AudioBackend, DeviceInfo, OutputStream, StreamRequest, device_not_found};
use crate::error::AudioError;
use crate::frame::AudioFrame;
use crate::sink::AudioSink;

/// Name of the single device a default [`ManualBackend`] exposes
pub const MANUAL_DEVICE: &str = "manual";

/// What a pull reads from
enum Output {
    /// Exactly one frame buffer per pull, at the engine rate
    Direct(AudioSink),
    /// Any number of frames per pull, resampled to the device rate
    Resampled(Reblocker),
}

#[derive(Default)]
struct ManualState {
    output: Option<Output>,
    paused: bool,
    streams_opened: usize,
}

/// Backend whose "driver" is whoever calls [`ManualBackend::pull`]
///
/// Clones share the same device; keep one clone as the puller after handing
/// another to the engine.
#[derive(Clone)]
pub struct ManualBackend {
    devices: Arc<Vec<String>>,
    device_rate: Option<u32>,
    state: Arc<Mutex<ManualState>>,
}

impl ManualBackend {
    /// One device named `"manual"` running at whatever rate is requested
    pub fn new() -> Self {
        Self::with_devices([MANUAL_DEVICE])
    }

    /// Expose the given device names; the first is the default
    pub fn with_devices<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: Arc::new(names.into_iter().map(Into::into).collect()),
            device_rate: None,
            state: Arc::default(),
        }
    }

    /// Run the device at `rate` regardless of the request
    ///
    /// Pulls then deliver any number of frames at `rate`, resampled from the
    /// engine rate the same way the cpal backend does.
    pub fn with_device_rate(mut self, rate: u32) -> Self {
        self.device_rate = Some(rate);
        self
    }

    /// Run one driver callback into `out`
    ///
    /// Writes silence when no stream is running or the stream is paused.
    /// Returns whether real audio was written.
    pub fn pull(&self, out: &mut [AudioFrame]) -> bool {
        let mut state = self.lock();
        let paused = state.paused;
        match state.output.as_mut() {
            Some(Output::Direct(sink)) if !paused => sink.fill(out),
            Some(Output::Resampled(reblocker)) if !paused => reblocker.fill(out),
            _ => {
                out.fill(AudioFrame::SILENCE);
                false
            }
        }
    }

    /// [`ManualBackend::pull`] into interleaved 16-bit stereo
    pub fn pull_interleaved(&self, out: &mut [i16]) -> bool {
        let mut state = self.lock();
        let paused = state.paused;
        match state.output.as_mut() {
            Some(Output::Direct(sink)) if !paused => sink.fill_interleaved(out),
            Some(Output::Resampled(reblocker)) if !paused => reblocker.fill_interleaved(out),
            _ => {
                out.fill(0);
                false
            }
        }
    }

    /// Whether a stream is currently attached and running
    pub fn is_streaming(&self) -> bool {
        let state = self.lock();
        state.output.is_some() && !state.paused
    }

    /// Streams opened over the backend's lifetime
    pub fn streams_opened(&self) -> usize {
        self.lock().streams_opened
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for ManualBackend {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, AudioError> {
        Ok(self
            .devices
            .iter()
            .enumerate()
            .map(|(i, name)| DeviceInfo {
                name: name.clone(),
                is_default: i == 0,
            })
            .collect())
    }

    fn open_stream(
        &self,
        request: &StreamRequest<'_>,
        sink: AudioSink,
    ) -> Result<Box<dyn OutputStream>, AudioError> {
        let device_name = match request.device {
            Some(wanted) => {
                if !self.devices.iter().any(|name| name == wanted) {
                    return Err(device_not_found(wanted, &self.list_devices()?));
                }
                wanted.to_string()
            }
            None => self
                .devices
                .first()
                .cloned()
                .ok_or(AudioError::NoDefaultDevice)?,
        };

        let device_rate = self.device_rate.unwrap_or(request.sample_rate);
        let output = if device_rate == request.sample_rate {
            Output::Direct(sink)
        } else {
            Output::Resampled(Reblocker::new(sink, request.sample_rate, device_rate)?)
        };

        let mut state = self.lock();
        state.output = Some(output);
        state.paused = false;
        state.streams_opened += 1;

        Ok(Box::new(ManualStream {
            state: Arc::clone(&self.state),
            sample_rate: request.sample_rate,
            device_rate,
            device_name,
        }))
    }
}

/// Stream handle returned by [`ManualBackend`]; detaches the sink on drop
pub struct ManualStream {
    state: Arc<Mutex<ManualState>>,
    sample_rate: u32,
    device_rate: u32,
    device_name: String,
}

impl OutputStream for ManualStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn device_sample_rate(&self) -> u32 {
        self.device_rate
    }

    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).paused = true;
        Ok(())
    }
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.output = None;
        state.paused = false;
    }
}
