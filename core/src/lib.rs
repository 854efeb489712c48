//! VERA Audio Core - emulated sound output for the Commander X16
//!
//! This crate bridges the emulated CPU clock to a real-time audio device:
//! elapsed CPU cycles are converted into frame-buffer render triggers, the
//! three sound chips are mixed, and finished buffers are handed to the
//! device callback through a fixed ring without either side blocking.
//!
//! # Architecture
//!
//! - [`ClockConverter`] - CPU cycles to render triggers, integer-only, drift-free
//! - [`Mixer`] - Renders PSG, PCM and FM sources and averages them
//! - [`RingBuffer`] - `ringbuf` SPSC ring of whole frame buffers, split into producer/consumer
//! - [`AudioSink`] - Real-time consumer invoked by the device callback
//! - [`AudioEngine`] - Lifecycle (open/close) and the `advance` entry point
//! - [`AudioBackend`] - Device enumeration and streams (cpal or host-driven)
//! - [`Reblocker`] - Device-sized callbacks to whole buffers, resampled to the device rate

pub mod backend;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod mixer;
pub mod ring;
pub mod sink;
pub mod source;
pub mod stats;

pub use backend::{
    AudioBackend, CpalBackend, DEVICE_NONE, DeviceInfo, ManualBackend, OutputStream, Reblocker,
};
pub use clock::ClockConverter;
pub use config::{AudioConfig, Config};
pub use engine::{AudioEngine, EngineState};
pub use error::AudioError;
pub use frame::{AudioFrame, FRAMES_PER_BUFFER, FrameBuffer, SAMPLE_RATE};
pub use mixer::Mixer;
pub use ring::{FrameConsumer, FrameProducer, MAX_BUFFER_COUNT, MIN_BUFFER_COUNT, RingBuffer};
pub use sink::AudioSink;
pub use source::{FM_CLOCK_HZ, Silence, SoundSource, SourceSet};
pub use stats::AudioStats;
