//! Device-paced delivery of whole frame buffers
//!
//! Hosts are free to ignore a fixed buffer size request, so a device may ask
//! for any number of frames per callback, at whatever rate it runs. The
//! [`Reblocker`] only ever asks the sink for exact frame buffers at the VERA
//! rate and hands out device-rate frames one at a time. When the two rates
//! differ each buffer goes through a `rubato` resampler, so the ring drains
//! exactly as fast as the emulated clock fills it.

use rubato::{FastFixedIn, PolynomialDegree, ResampleError, Resampler};
use tracing::{debug, error};

use crate::error::AudioError;
use crate::frame::{AudioFrame, FrameBuffer};
use crate::sink::AudioSink;

/// Bridges device-sized callbacks onto whole frame-buffer pulls
pub struct Reblocker {
    sink: AudioSink,
    /// Last buffer pulled from the sink, at the source rate
    block: FrameBuffer,
    /// Frames ready for the device
    pending: Vec<AudioFrame>,
    position: usize,
    converter: Option<RateConverter>,
    /// A sink pull came back empty since the last `fill`
    starved: bool,
    resample_failed: bool,
}

impl Reblocker {
    /// Feed a device running at `device_rate` from a sink producing `source_rate`
    ///
    /// # Errors
    ///
    /// Fails if no resampler can be built for the rate pair.
    pub fn new(sink: AudioSink, source_rate: u32, device_rate: u32) -> Result<Self, AudioError> {
        let frames = sink.frames_per_buffer();
        let converter = if source_rate == device_rate {
            None
        } else {
            debug!("Resampling {} Hz -> {} Hz", source_rate, device_rate);
            Some(RateConverter::new(source_rate, device_rate, frames)?)
        };
        let pending_len = converter
            .as_ref()
            .map_or(frames, |c| c.output_frames_max().max(frames));

        Ok(Self {
            sink,
            block: FrameBuffer::silent(frames),
            pending: Vec::with_capacity(pending_len),
            position: 0,
            converter,
            starved: false,
            resample_failed: false,
        })
    }

    /// Whether buffers are resampled on the way out
    pub fn is_resampling(&self) -> bool {
        self.converter.is_some()
    }

    /// Next device-rate frame, pulling a new buffer from the sink when needed
    pub fn next_frame(&mut self) -> AudioFrame {
        if self.position >= self.pending.len() {
            self.refill();
        }
        let frame = self
            .pending
            .get(self.position)
            .copied()
            .unwrap_or(AudioFrame::SILENCE);
        self.position += 1;
        frame
    }

    /// Fill `out` with device-rate frames
    ///
    /// Returns `false` if any buffer pulled during this call was silence.
    pub fn fill(&mut self, out: &mut [AudioFrame]) -> bool {
        self.starved = false;
        for frame in out {
            *frame = self.next_frame();
        }
        !self.starved
    }

    /// [`Reblocker::fill`] into interleaved 16-bit stereo
    pub fn fill_interleaved(&mut self, out: &mut [i16]) -> bool {
        self.starved = false;
        for pair in out.chunks_exact_mut(2) {
            let frame = self.next_frame();
            pair[0] = frame.left;
            pair[1] = frame.right;
        }
        !self.starved
    }

    fn refill(&mut self) {
        if !self.sink.fill(self.block.frames_mut()) {
            self.starved = true;
        }
        self.position = 0;
        self.pending.clear();

        let Some(converter) = self.converter.as_mut() else {
            self.pending.extend_from_slice(self.block.frames());
            return;
        };
        if let Err(e) = converter.process(self.block.frames(), &mut self.pending) {
            if !self.resample_failed {
                error!("Resampling failed, passing audio through: {}", e);
                self.resample_failed = true;
            }
            self.pending.clear();
            self.pending.extend_from_slice(self.block.frames());
        }
    }
}

/// Fixed-input stereo resampler with pre-allocated planar buffers
struct RateConverter {
    resampler: FastFixedIn<f32>,
    input: [Vec<f32>; 2],
    output: [Vec<f32>; 2],
}

impl RateConverter {
    fn new(source_rate: u32, device_rate: u32, frames: usize) -> Result<Self, AudioError> {
        let ratio = device_rate as f64 / source_rate as f64;
        let resampler = FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, frames, 2)?;
        let out_len = resampler.output_frames_max();
        Ok(Self {
            resampler,
            input: [vec![0.0; frames], vec![0.0; frames]],
            output: [vec![0.0; out_len], vec![0.0; out_len]],
        })
    }

    fn output_frames_max(&self) -> usize {
        self.output[0].len()
    }

    /// Resample one source buffer, appending the result to `out`
    fn process(&mut self, block: &[AudioFrame], out: &mut Vec<AudioFrame>) -> Result<(), ResampleError> {
        let [left, right] = &mut self.input;
        for ((l, r), frame) in left.iter_mut().zip(right.iter_mut()).zip(block) {
            *l = to_f32(frame.left);
            *r = to_f32(frame.right);
        }

        let (_, written) = self
            .resampler
            .process_into_buffer(&self.input, &mut self.output, None)?;

        let [left, right] = &self.output;
        out.extend(
            left[..written]
                .iter()
                .zip(&right[..written])
                .map(|(&l, &r)| AudioFrame::new(to_i16(l), to_i16(r))),
        );
        Ok(())
    }
}

fn to_f32(sample: i16) -> f32 {
    sample as f32 / 32_768.0
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32_768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
