//! Stereo frame types and the fixed audio format
//!
//! Audio format:
//! - 16-bit signed samples, interleaved stereo (left, right)
//! - Sample rate derived from the 25 MHz VERA clock (one sample per 512 clocks)
//! - Frame buffers are a fixed number of frames, decided at build time

/// VERA master clock in Hz
pub const VERA_CLOCK_HZ: u32 = 25_000_000;

/// VERA clocks consumed per output sample
pub const VERA_CLOCKS_PER_SAMPLE: u32 = 512;

/// Output sample rate (48,828 Hz)
pub const SAMPLE_RATE: u32 = VERA_CLOCK_HZ / VERA_CLOCKS_PER_SAMPLE;

/// Output channel count (always stereo)
pub const CHANNELS: u16 = 2;

/// Frames per frame buffer
///
/// Browsers schedule audio callbacks with far more jitter than native hosts,
/// so wasm builds use a longer buffer.
#[cfg(target_arch = "wasm32")]
pub const FRAMES_PER_BUFFER: usize = 1024;

/// Frames per frame buffer
#[cfg(not(target_arch = "wasm32"))]
pub const FRAMES_PER_BUFFER: usize = 256;

/// One stereo sample pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AudioFrame {
    pub left: i16,
    pub right: i16,
}

impl AudioFrame {
    /// The all-zero frame
    pub const SILENCE: Self = Self { left: 0, right: 0 };

    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Same sample on both channels
    pub const fn mono(sample: i16) -> Self {
        Self {
            left: sample,
            right: sample,
        }
    }

    pub fn is_silent(&self) -> bool {
        *self == Self::SILENCE
    }
}

/// A fixed-length run of frames, produced and consumed as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    frames: Box<[AudioFrame]>,
}

impl FrameBuffer {
    /// Create a silent buffer of `len` frames
    pub fn silent(len: usize) -> Self {
        Self {
            frames: vec![AudioFrame::SILENCE; len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[AudioFrame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [AudioFrame] {
        &mut self.frames
    }

    /// True if every frame is silent
    pub fn is_silent(&self) -> bool {
        self.frames.iter().all(AudioFrame::is_silent)
    }

    /// Write the buffer out as interleaved samples (L, R, L, R, ...)
    ///
    /// `out` must hold exactly `2 * len()` samples.
    pub fn write_interleaved(&self, out: &mut [i16]) {
        debug_assert_eq!(out.len(), self.frames.len() * CHANNELS as usize);
        for (pair, frame) in out.chunks_exact_mut(2).zip(self.frames.iter()) {
            pair[0] = frame.left;
            pair[1] = frame.right;
        }
    }
}

impl From<Vec<AudioFrame>> for FrameBuffer {
    fn from(frames: Vec<AudioFrame>) -> Self {
        Self {
            frames: frames.into_boxed_slice(),
        }
    }
}
