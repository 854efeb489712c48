//! Audio engine: clock conversion, mixing and device hand-off
//!
//! # Architecture
//!
//! ```text
//! Emulation Thread                                   Audio Driver Thread
//!     │                                                      │
//! [advance(cycles)]                                          │
//!     │                                                      │
//! [ClockConverter]──trigger──►[Mixer]                        │
//!                               │ render PSG, PCM, FM        │
//!                               │ average                    │
//!                             [Publish]────(ring)────────►[AudioSink]
//!                               (drop on overrun)            (silence on underrun)
//! ```
//!
//! # Lifecycle
//!
//! `Uninitialized ──open──► Open ──close──► Closed ──open──► Open ...`
//!
//! Opening with the `"none"` device from any state releases any open session
//! and leaves the engine `Uninitialized`; `advance` is a no-op in every state
//! except `Open`.
//!
//! Sources always render at the VERA rate. A device that runs at another
//! rate is fed through a resampler inside the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::backend::{AudioBackend, CpalBackend, DEVICE_NONE, DeviceInfo, OutputStream, StreamRequest};
use crate::clock::ClockConverter;
use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::frame::{CHANNELS, FRAMES_PER_BUFFER, SAMPLE_RATE};
use crate::mixer::{MixStats, Mixer};
use crate::ring::{FrameProducer, RingBuffer, RingSnapshot, clamp_buffer_count};
use crate::sink::{AudioSink, SinkCounters, SinkStats};
use crate::source::SourceSet;
use crate::stats::AudioStats;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Never opened, or opened with the `"none"` device
    Uninitialized,
    /// Streaming to a device
    Open,
    /// Was open; device and buffers released
    Closed,
}

/// Everything that exists only while the engine is open
struct Session {
    producer: FrameProducer,
    stream: Box<dyn OutputStream>,
    open: Arc<AtomicBool>,
    counters: Arc<SinkCounters>,
}

/// Bridges emulated CPU time to a real-time audio device
pub struct AudioEngine<B: AudioBackend = CpalBackend> {
    backend: B,
    mixer: Mixer,
    clock: ClockConverter,
    session: Option<Session>,
    state: EngineState,
    frames_per_buffer: usize,
}

impl AudioEngine<CpalBackend> {
    /// Engine on the platform's default cpal host
    pub fn new(sources: SourceSet) -> Self {
        Self::with_backend(CpalBackend::new(), sources)
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn with_backend(backend: B, sources: SourceSet) -> Self {
        Self {
            backend,
            mixer: Mixer::new(sources, FRAMES_PER_BUFFER),
            clock: ClockConverter::new(FRAMES_PER_BUFFER),
            session: None,
            state: EngineState::Uninitialized,
            frames_per_buffer: FRAMES_PER_BUFFER,
        }
    }

    /// Open the output device and start streaming
    ///
    /// `device` selects an output by name (`None` for the default, `"none"`
    /// to leave audio disabled). `requested_buffers` is clamped to 3..=1024.
    /// An already open engine is closed first.
    ///
    /// # Errors
    ///
    /// Fails if the frame-buffer pool cannot be allocated or the device
    /// cannot be opened. A missing named device reports the devices that do
    /// exist (see [`AudioError::available_devices`]). The engine is left
    /// not open on failure.
    pub fn open(&mut self, device: Option<&str>, requested_buffers: usize) -> Result<(), AudioError> {
        if self.session.is_some() {
            self.close();
        }

        if device == Some(DEVICE_NONE) {
            self.state = EngineState::Uninitialized;
            debug!("Audio output disabled");
            return Ok(());
        }

        let capacity = clamp_buffer_count(requested_buffers);
        let ring = RingBuffer::new(capacity, self.frames_per_buffer)?;
        let (producer, consumer) = ring.split();

        // The sink answers with silence until the flag flips below, so the
        // callback can safely start before the FM source is configured.
        let open = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(SinkCounters::default());
        let sink = AudioSink::new(consumer, Arc::clone(&open), Arc::clone(&counters));

        let request = StreamRequest {
            device,
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            frames_per_buffer: self.frames_per_buffer,
        };
        let stream = self.backend.open_stream(&request, sink)?;

        let sample_rate = stream.sample_rate();
        self.mixer.sources_mut().configure(sample_rate);
        self.mixer.reset_stats();
        self.clock.reset();
        open.store(true, Ordering::Release);

        info!(
            "Audio engine open on '{}': {} Hz (device {} Hz), {} buffers of {} frames",
            stream.device_name(),
            sample_rate,
            stream.device_sample_rate(),
            capacity,
            self.frames_per_buffer
        );

        self.session = Some(Session {
            producer,
            stream,
            open,
            counters,
        });
        self.state = EngineState::Open;
        Ok(())
    }

    /// Open using the device and buffer count from `config`
    pub fn open_with_config(&mut self, config: &AudioConfig) -> Result<(), AudioError> {
        self.open(config.device.as_deref(), config.buffer_count)
    }

    /// Stop the device callback, then release the frame-buffer pool
    ///
    /// No-op unless open.
    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Err(e) = session.stream.pause() {
            warn!("Failed to pause audio stream before close: {}", e);
        }
        session.open.store(false, Ordering::Release);
        // Dropping the stream ends the callback and releases the consumer
        // half; the ring goes with the producer.
        drop(session.stream);
        drop(session.producer);

        self.state = EngineState::Closed;
        debug!("Audio engine closed");
    }

    /// Account for `cpu_cycles` of emulated time, mixing every frame buffer
    /// that becomes due
    ///
    /// Returns the number of triggers handled (0 when not open).
    pub fn advance(&mut self, cpu_cycles: u64) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };

        let triggers = self.clock.advance(cpu_cycles);
        for _ in 0..triggers {
            self.mixer.render(&mut session.producer);
        }
        triggers
    }

    /// Output devices the backend can open
    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>, AudioError> {
        self.backend.list_devices()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == EngineState::Open
    }

    /// Rate the sources render at while open
    pub fn sample_rate(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.stream.sample_rate())
    }

    /// Rate the output hardware runs at while open
    pub fn device_sample_rate(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.stream.device_sample_rate())
    }

    /// Device name while open
    pub fn device_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.stream.device_name())
    }

    /// Effective ring capacity while open
    pub fn buffer_count(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.producer.capacity())
    }

    pub fn ring_snapshot(&self) -> Option<RingSnapshot> {
        self.session.as_ref().map(|s| s.producer.snapshot())
    }

    pub fn frames_per_buffer(&self) -> usize {
        self.frames_per_buffer
    }

    /// Counters for the current session (zeroed when not open)
    pub fn stats(&self) -> AudioStats {
        match &self.session {
            Some(session) => AudioStats::combine(
                self.mixer.stats(),
                session.counters.snapshot(),
                session.producer.snapshot().count,
            ),
            None => AudioStats::combine(MixStats::default(), SinkStats::default(), 0),
        }
    }

    pub fn clock(&self) -> &ClockConverter {
        &self.clock
    }

    pub fn sources_mut(&mut self) -> &mut SourceSet {
        self.mixer.sources_mut()
    }
}

impl<B: AudioBackend> Drop for AudioEngine<B> {
    fn drop(&mut self) {
        self.close();
    }
}
