//! Sound source seam
//!
//! The three VERA-era sound chips (PSG, PCM, YM2151 FM) are emulated
//! elsewhere. The engine only asks each of them for a run of frames per
//! trigger, so anything that can fill a frame slice can stand in for a chip.

use crate::frame::{AudioFrame, VERA_CLOCK_HZ};

/// YM2151 master clock in Hz (NTSC colorburst crystal)
pub const FM_CLOCK_HZ: u32 = 3_579_545;

/// A synthesizer that renders stereo frames on demand
pub trait SoundSource: Send {
    /// Render exactly `out.len()` frames, advancing internal state by as many
    fn render(&mut self, out: &mut [AudioFrame]);

    /// Called once per open with the rate frames are rendered at and the
    /// chip's master clock
    ///
    /// Sources that resample internally (the FM chip) use this to set up
    /// their clock-to-output rate conversion.
    fn configure(&mut self, _sample_rate: u32, _clock_hz: u32) {}
}

/// Source that only ever renders silence
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl SoundSource for Silence {
    fn render(&mut self, out: &mut [AudioFrame]) {
        out.fill(AudioFrame::SILENCE);
    }
}

impl<F> SoundSource for F
where
    F: FnMut(&mut [AudioFrame]) + Send,
{
    fn render(&mut self, out: &mut [AudioFrame]) {
        self(out)
    }
}

/// The three chip outputs mixed into every frame buffer
pub struct SourceSet {
    /// Programmable square/noise generator
    pub psg: Box<dyn SoundSource>,
    /// PCM sample FIFO player
    pub pcm: Box<dyn SoundSource>,
    /// FM synthesizer
    pub fm: Box<dyn SoundSource>,
}

impl SourceSet {
    pub fn new(
        psg: impl SoundSource + 'static,
        pcm: impl SoundSource + 'static,
        fm: impl SoundSource + 'static,
    ) -> Self {
        Self {
            psg: Box::new(psg),
            pcm: Box::new(pcm),
            fm: Box::new(fm),
        }
    }

    /// Tell every source the render rate and its master clock
    ///
    /// The PSG and PCM run off the VERA clock; the FM chip has its own crystal.
    pub fn configure(&mut self, sample_rate: u32) {
        self.psg.configure(sample_rate, VERA_CLOCK_HZ);
        self.pcm.configure(sample_rate, VERA_CLOCK_HZ);
        self.fm.configure(sample_rate, FM_CLOCK_HZ);
    }
}

impl Default for SourceSet {
    fn default() -> Self {
        Self::new(Silence, Silence, Silence)
    }
}
