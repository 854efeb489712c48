//! Three-source mixing into the frame ring
//!
//! Every trigger renders one frame buffer from each chip, whether or not
//! the ring has room: chip state must keep pace with emulated time even
//! when output is being dropped.

use crate::frame::{AudioFrame, FrameBuffer};
use crate::ring::FrameProducer;
use crate::source::SourceSet;

/// Average three samples, truncating toward zero
#[inline]
pub fn mix_sample(a: i16, b: i16, c: i16) -> i16 {
    // |a + b + c| / 3 never exceeds i16::MAX magnitude
    ((a as i32 + b as i32 + c as i32) / 3) as i16
}

/// Average three frames channel by channel
#[inline]
pub fn mix_frame(a: AudioFrame, b: AudioFrame, c: AudioFrame) -> AudioFrame {
    AudioFrame {
        left: mix_sample(a.left, b.left, c.left),
        right: mix_sample(a.right, b.right, c.right),
    }
}

/// Mix three equal-length frame slices into `out`
pub fn mix_into(out: &mut [AudioFrame], a: &[AudioFrame], b: &[AudioFrame], c: &[AudioFrame]) {
    for (((dst, &a), &b), &c) in out.iter_mut().zip(a).zip(b).zip(c) {
        *dst = mix_frame(a, b, c);
    }
}

/// Producer-side counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixStats {
    /// Frame buffers mixed and published
    pub buffers_mixed: u64,
    /// Frame buffers rendered but dropped because the ring was full
    pub buffers_dropped: u64,
}

/// Renders the sources and publishes mixed buffers
pub struct Mixer {
    sources: SourceSet,
    psg: FrameBuffer,
    pcm: FrameBuffer,
    fm: FrameBuffer,
    stats: MixStats,
}

impl Mixer {
    pub fn new(sources: SourceSet, frames_per_buffer: usize) -> Self {
        Self {
            sources,
            psg: FrameBuffer::silent(frames_per_buffer),
            pcm: FrameBuffer::silent(frames_per_buffer),
            fm: FrameBuffer::silent(frames_per_buffer),
            stats: MixStats::default(),
        }
    }

    /// Handle one trigger: render all sources, then publish if a slot is free
    ///
    /// Returns whether the mixed buffer reached the ring. A full ring is an
    /// overrun and the buffer is discarded without complaint.
    pub fn render(&mut self, producer: &mut FrameProducer) -> bool {
        self.sources.psg.render(self.psg.frames_mut());
        self.sources.pcm.render(self.pcm.frames_mut());
        self.sources.fm.render(self.fm.frames_mut());

        let published = producer.try_reserve_slot()
            && producer.publish_with(|slot| {
                mix_into(slot, self.psg.frames(), self.pcm.frames(), self.fm.frames())
            });

        if published {
            self.stats.buffers_mixed += 1;
        } else {
            self.stats.buffers_dropped += 1;
        }
        published
    }

    pub fn frames_per_buffer(&self) -> usize {
        self.psg.len()
    }

    pub fn sources_mut(&mut self) -> &mut SourceSet {
        &mut self.sources
    }

    pub fn stats(&self) -> MixStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MixStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingBuffer;
    use crate::source::Silence;

    fn constant(left: i16, right: i16) -> impl FnMut(&mut [AudioFrame]) + Send {
        move |out: &mut [AudioFrame]| out.fill(AudioFrame::new(left, right))
    }

    #[test]
    fn test_mix_sample_average() {
        assert_eq!(mix_sample(300, -150, 30), 60);
        assert_eq!(mix_sample(1, 1, 1), 1);
        assert_eq!(mix_sample(0, 0, 0), 0);
    }

    #[test]
    fn test_mix_sample_truncates_toward_zero() {
        assert_eq!(mix_sample(-1, -1, -2), -1);
        assert_eq!(mix_sample(1, 1, 2), 1);
        assert_eq!(mix_sample(-1, 0, 0), 0);
    }

    #[test]
    fn test_mix_sample_extremes_do_not_overflow() {
        assert_eq!(mix_sample(i16::MAX, i16::MAX, i16::MAX), i16::MAX);
        assert_eq!(mix_sample(i16::MIN, i16::MIN, i16::MIN), i16::MIN);
        assert_eq!(mix_sample(i16::MAX, i16::MIN, 0), 0);
    }

    #[test]
    fn test_mix_frame_keeps_channels_apart() {
        let mixed = mix_frame(
            AudioFrame::new(300, 3),
            AudioFrame::new(-150, 3),
            AudioFrame::new(30, 3),
        );
        assert_eq!(mixed, AudioFrame::new(60, 3));
    }

    #[test]
    fn test_render_publishes_mixed_buffer() {
        let (mut producer, mut consumer) = RingBuffer::new(3, 8).unwrap().split();
        let sources = SourceSet::new(constant(300, 9), constant(-150, 0), constant(30, -3));
        let mut mixer = Mixer::new(sources, 8);

        assert!(mixer.render(&mut producer));
        let buffer = consumer.consume().unwrap();
        assert!(buffer.frames().iter().all(|f| *f == AudioFrame::new(60, 2)));
        assert_eq!(mixer.stats().buffers_mixed, 1);
    }

    #[test]
    fn test_sources_advance_even_when_ring_is_full() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let rendered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&rendered);
        let psg = move |out: &mut [AudioFrame]| {
            counter.fetch_add(out.len(), Ordering::Relaxed);
            out.fill(AudioFrame::mono(3));
        };

        let (mut producer, _consumer) = RingBuffer::new(3, 4).unwrap().split();
        let mut mixer = Mixer::new(SourceSet::new(psg, Silence, Silence), 4);

        let published: Vec<bool> = (0..5).map(|_| mixer.render(&mut producer)).collect();
        assert_eq!(published, [true, true, true, false, false]);
        assert_eq!(rendered.load(Ordering::Relaxed), 5 * 4);
        assert_eq!(
            mixer.stats(),
            MixStats {
                buffers_mixed: 3,
                buffers_dropped: 2,
            }
        );
    }
}
