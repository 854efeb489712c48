//! Demonstration sources standing in for the sound chips
//!
//! Real chip emulation lives outside the engine; these only exist so the
//! CLI has something audible to push through the mixer.

use vera_audio_core::{AudioFrame, SAMPLE_RATE, Silence, SoundSource, SourceSet};

/// PSG square plus an FM-side triangle a fifth above; PCM stays silent
pub fn demo_sources(freq: f32) -> SourceSet {
    SourceSet::new(
        SquareTone::new(freq, 6_000),
        Silence,
        TriangleTone::new(freq * 1.5, 9_000),
    )
}

/// Phase increment per sample for `freq` Hz at `rate` Hz (32-bit phase)
fn phase_step(freq: f32, rate: u32) -> u32 {
    ((freq as f64 / rate as f64) * 4_294_967_296.0) as u32
}

/// Square wave at the fixed VERA rate, like the PSG's pulse channels
pub struct SquareTone {
    phase: u32,
    step: u32,
    amplitude: i16,
}

impl SquareTone {
    pub fn new(freq: f32, amplitude: i16) -> Self {
        Self {
            phase: 0,
            step: phase_step(freq, SAMPLE_RATE),
            amplitude,
        }
    }
}

impl SoundSource for SquareTone {
    fn render(&mut self, out: &mut [AudioFrame]) {
        for frame in out {
            let sample = if self.phase < 0x8000_0000 {
                self.amplitude
            } else {
                -self.amplitude
            };
            *frame = AudioFrame::mono(sample);
            self.phase = self.phase.wrapping_add(self.step);
        }
    }
}

/// Triangle wave that follows the configured render rate, like the FM chip
pub struct TriangleTone {
    phase: u32,
    step: u32,
    freq: f32,
    amplitude: i16,
}

impl TriangleTone {
    pub fn new(freq: f32, amplitude: i16) -> Self {
        Self {
            phase: 0,
            step: phase_step(freq, SAMPLE_RATE),
            freq,
            amplitude,
        }
    }
}

impl SoundSource for TriangleTone {
    fn render(&mut self, out: &mut [AudioFrame]) {
        for frame in out {
            let p = (self.phase >> 16) as i32;
            // -32768..=32767 rising over the first half, falling over the second
            let unit = if p < 0x8000 { p * 2 - 0x8000 } else { (0xFFFF - p) * 2 - 0x8000 };
            let sample = (unit * self.amplitude as i32) >> 15;
            *frame = AudioFrame::mono(sample as i16);
            self.phase = self.phase.wrapping_add(self.step);
        }
    }

    fn configure(&mut self, sample_rate: u32, _clock_hz: u32) {
        self.step = phase_step(self.freq, sample_rate);
    }
}
