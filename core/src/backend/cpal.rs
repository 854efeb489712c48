//! Audio output using cpal

use ::cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ::cpal::{
    BufferSize, Device, FromSample, Host, Sample, SampleFormat, SampleRate, SizedSample, Stream,
    StreamConfig, SupportedBufferSize, SupportedStreamConfig,
};
use tracing::{debug, error, info, warn};

use super::reblock::Reblocker;
use super::{AudioBackend, DeviceInfo, OutputStream, StreamRequest, device_not_found};
use crate::error::AudioError;
use crate::frame::AudioFrame;
use crate::sink::AudioSink;

/// Output backend on the platform's default cpal host
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: ::cpal::default_host(),
        }
    }

    fn find_device(&self, selector: Option<&str>) -> Result<Device, AudioError> {
        let Some(wanted) = selector else {
            return self
                .host
                .default_output_device()
                .ok_or(AudioError::NoDefaultDevice);
        };

        for device in self.host.output_devices()? {
            if device.name().is_ok_and(|name| name == wanted) {
                return Ok(device);
            }
        }

        let devices = self.list_devices()?;
        Err(device_not_found(wanted, &devices))
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, AudioError> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let mut devices = Vec::new();
        for device in self.host.output_devices()? {
            // Devices that cannot report a name cannot be selected either
            if let Ok(name) = device.name() {
                devices.push(DeviceInfo {
                    is_default: name == default_name,
                    name,
                });
            }
        }
        Ok(devices)
    }

    fn open_stream(
        &self,
        request: &StreamRequest<'_>,
        sink: AudioSink,
    ) -> Result<Box<dyn OutputStream>, AudioError> {
        let device = self.find_device(request.device)?;
        let device_name = device.name()?;

        let supported = choose_config(&device, request)?;
        let sample_format = supported.sample_format();
        let buffer_size = match supported.buffer_size() {
            SupportedBufferSize::Range { min, max }
                if (*min..=*max).contains(&(request.frames_per_buffer as u32)) =>
            {
                BufferSize::Fixed(request.frames_per_buffer as u32)
            }
            _ => BufferSize::Default,
        };
        let mut config: StreamConfig = supported.config();
        config.buffer_size = buffer_size;

        let device_rate = config.sample_rate.0;
        if device_rate != request.sample_rate {
            warn!(
                "Device '{}' cannot run at {} Hz, resampling to {} Hz",
                device_name, request.sample_rate, device_rate
            );
        }
        let reblocker = Reblocker::new(sink, request.sample_rate, device_rate)?;

        let stream = match sample_format {
            SampleFormat::I16 => build_stream::<i16>(&device, &config, reblocker)?,
            SampleFormat::F32 => build_stream::<f32>(&device, &config, reblocker)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, reblocker)?,
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        };

        stream.play()?;

        info!(
            "Audio output on '{}': {} Hz, {} channels, {:?}, buffer {:?}",
            device_name, device_rate, config.channels, sample_format, config.buffer_size
        );

        Ok(Box::new(CpalStream {
            stream,
            sample_rate: request.sample_rate,
            device_rate,
            device_name,
        }))
    }
}

/// Pick the closest supported config to the request
///
/// Preference: native i16 stereo at the requested rate, then any supported
/// format in stereo at the requested rate, then the device default.
fn choose_config(
    device: &Device,
    request: &StreamRequest<'_>,
) -> Result<SupportedStreamConfig, AudioError> {
    let rate = SampleRate(request.sample_rate);
    let candidates: Vec<_> = device
        .supported_output_configs()?
        .filter(|range| range.channels() == request.channels)
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .filter(|range| {
            matches!(
                range.sample_format(),
                SampleFormat::I16 | SampleFormat::F32 | SampleFormat::U16
            )
        })
        .collect();

    let preferred = candidates
        .iter()
        .find(|range| range.sample_format() == SampleFormat::I16)
        .or_else(|| candidates.first());

    match preferred {
        Some(range) => Ok(range.clone().with_sample_rate(rate)),
        None => {
            debug!("No stereo config at {} Hz, falling back to device default", rate.0);
            Ok(device.default_output_config()?)
        }
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut reblocker: Reblocker,
) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<i16> + Send + 'static,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &::cpal::OutputCallbackInfo| {
            for out in data.chunks_mut(channels) {
                write_frame(out, reblocker.next_frame());
            }
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

fn write_frame<T>(out: &mut [T], frame: AudioFrame)
where
    T: Sample + FromSample<i16>,
{
    match out {
        [mono] => {
            let sample = (frame.left as i32 + frame.right as i32) / 2;
            *mono = T::from_sample(sample as i16);
        }
        [left, right, rest @ ..] => {
            *left = T::from_sample(frame.left);
            *right = T::from_sample(frame.right);
            rest.fill(T::EQUILIBRIUM);
        }
        [] => {}
    }
}

struct CpalStream {
    stream: Stream,
    sample_rate: u32,
    device_rate: u32,
    device_name: String,
}

impl OutputStream for CpalStream {
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
        self.stream.pause()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_frame_channel_layouts() {
        let frame = AudioFrame::new(100, -50);

        let mut mono = [0i16; 1];
        write_frame(&mut mono, frame);
        assert_eq!(mono, [25]);

        let mut stereo = [0i16; 2];
        write_frame(&mut stereo, frame);
        assert_eq!(stereo, [100, -50]);

        let mut surround = [9i16; 4];
        write_frame(&mut surround, frame);
        assert_eq!(surround, [100, -50, 0, 0]);

        let mut float = [1.0f32; 2];
        write_frame(&mut float, AudioFrame::new(0, i16::MIN));
        assert_eq!(float, [0.0, -1.0]);
    }
}
