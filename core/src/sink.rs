//! Real-time consumer side of the engine
//!
//! The platform audio driver calls into [`AudioSink`] on its own thread at a
//! fixed period. The sink never blocks and never allocates: it either copies
//! one finished frame buffer out of the ring or writes silence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::warn;

use crate::frame::{AudioFrame, CHANNELS, FrameBuffer};
use crate::ring::{FrameConsumer, RingSnapshot};

/// Consumer-side counters, shared with the engine
#[derive(Debug, Default)]
pub struct SinkCounters {
    buffers_played: AtomicU64,
    underruns: AtomicU64,
    size_mismatches: AtomicU64,
}

impl SinkCounters {
    pub fn snapshot(&self) -> SinkStats {
        SinkStats {
            buffers_played: self.buffers_played.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            size_mismatches: self.size_mismatches.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`SinkCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Frame buffers copied out to the device
    pub buffers_played: u64,
    /// Callbacks answered with silence because the ring was empty
    pub underruns: u64,
    /// Callbacks that asked for an unexpected number of frames
    pub size_mismatches: u64,
}

/// The audio-callback half of an open engine
pub struct AudioSink {
    consumer: FrameConsumer,
    open: Arc<AtomicBool>,
    counters: Arc<SinkCounters>,
    /// Scratch buffer for interleaved output
    staging: FrameBuffer,
}

impl AudioSink {
    pub fn new(consumer: FrameConsumer, open: Arc<AtomicBool>, counters: Arc<SinkCounters>) -> Self {
        let staging = FrameBuffer::silent(consumer.frames_per_buffer());
        Self {
            consumer,
            open,
            counters,
            staging,
        }
    }

    /// Frames expected per call
    pub fn frames_per_buffer(&self) -> usize {
        self.consumer.frames_per_buffer()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Fill one frame buffer of output
    ///
    /// Writes silence if the engine is closed, the ring is empty, or `out`
    /// is not exactly one frame buffer long. Returns whether real audio was
    /// written.
    pub fn fill(&mut self, out: &mut [AudioFrame]) -> bool {
        if !self.is_open() {
            out.fill(AudioFrame::SILENCE);
            return false;
        }

        let expected = self.frames_per_buffer();
        if out.len() != expected {
            self.report_mismatch(expected, out.len());
            out.fill(AudioFrame::SILENCE);
            return false;
        }

        if self.consumer.consume_into(out) {
            self.counters.buffers_played.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.counters.underruns.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Fill interleaved 16-bit stereo output (L, R, L, R, ...)
    ///
    /// `out` must hold exactly one frame buffer of samples; the same
    /// silence rules as [`AudioSink::fill`] apply.
    pub fn fill_interleaved(&mut self, out: &mut [i16]) -> bool {
        let expected = self.frames_per_buffer() * CHANNELS as usize;
        if out.len() != expected {
            if self.is_open() {
                self.report_mismatch(expected, out.len());
            }
            out.fill(0);
            return false;
        }

        let mut staging = std::mem::replace(&mut self.staging, FrameBuffer::silent(0));
        let played = self.fill(staging.frames_mut());
        staging.write_interleaved(out);
        self.staging = staging;
        played
    }

    pub fn ring_snapshot(&self) -> RingSnapshot {
        self.consumer.snapshot()
    }

    fn report_mismatch(&self, expected: usize, got: usize) {
        self.counters.size_mismatches.fetch_add(1, Ordering::Relaxed);
        warn!("Audio buffer size mismatch! (expected: {}, got: {})", expected, got);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingBuffer;

    fn open_sink(capacity: usize, frames: usize) -> (crate::ring::FrameProducer, AudioSink, Arc<AtomicBool>) {
        let (producer, consumer) = RingBuffer::new(capacity, frames).unwrap().split();
        let open = Arc::new(AtomicBool::new(true));
        let sink = AudioSink::new(consumer, Arc::clone(&open), Arc::default());
        (producer, sink, open)
    }

    #[test]
    fn test_fill_copies_published_buffer() {
        let (mut producer, mut sink, _open) = open_sink(3, 4);
        let frames = [
            AudioFrame::new(1, 2),
            AudioFrame::new(3, 4),
            AudioFrame::new(5, 6),
            AudioFrame::new(7, 8),
        ];
        producer.publish(&frames);

        let mut out = [AudioFrame::SILENCE; 4];
        assert!(sink.fill(&mut out));
        assert_eq!(out, frames);
        assert_eq!(sink.counters.snapshot().buffers_played, 1);
    }

    #[test]
    fn test_underrun_writes_silence() {
        let (_producer, mut sink, _open) = open_sink(3, 4);
        let mut out = [AudioFrame::new(9, 9); 4];
        assert!(!sink.fill(&mut out));
        assert!(out.iter().all(AudioFrame::is_silent));
        assert_eq!(sink.counters.snapshot().underruns, 1);
        assert_eq!(sink.ring_snapshot().count, 0);
    }

    #[test]
    fn test_closed_sink_writes_silence_and_keeps_ring() {
        let (mut producer, mut sink, open) = open_sink(3, 2);
        producer.publish(&[AudioFrame::mono(5); 2]);
        open.store(false, Ordering::Release);

        let mut out = [AudioFrame::new(9, 9); 2];
        assert!(!sink.fill(&mut out));
        assert!(out.iter().all(AudioFrame::is_silent));
        assert_eq!(sink.ring_snapshot().count, 1);
    }

    #[test]
    fn test_size_mismatch_is_reported_not_fatal() {
        let (mut producer, mut sink, _open) = open_sink(3, 4);
        producer.publish(&[AudioFrame::mono(5); 4]);

        let mut short = [AudioFrame::new(9, 9); 3];
        assert!(!sink.fill(&mut short));
        assert!(short.iter().all(AudioFrame::is_silent));
        assert_eq!(sink.counters.snapshot().size_mismatches, 1);

        // The ring was not drained, so the next correct call still plays
        let mut out = [AudioFrame::SILENCE; 4];
        assert!(sink.fill(&mut out));
        assert_eq!(out, [AudioFrame::mono(5); 4]);
    }

    #[test]
    fn test_fill_interleaved() {
        let (mut producer, mut sink, _open) = open_sink(3, 2);
        producer.publish(&[AudioFrame::new(100, -100), AudioFrame::new(-7, 7)]);

        let mut out = [0i16; 4];
        assert!(sink.fill_interleaved(&mut out));
        assert_eq!(out, [100, -100, -7, 7]);

        let mut wrong = [1i16; 3];
        assert!(!sink.fill_interleaved(&mut wrong));
        assert_eq!(wrong, [0, 0, 0]);
    }
}
