//! Engine health counters

use crate::mixer::MixStats;
use crate::sink::SinkStats;

/// Snapshot of producer and consumer counters for the current session
///
/// Overruns (`buffers_dropped`) and underruns are expected under load and
/// at startup; they are counted here rather than reported as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStats {
    /// Frame buffers mixed and published to the ring
    pub buffers_mixed: u64,
    /// Frame buffers rendered but dropped on a full ring
    pub buffers_dropped: u64,
    /// Frame buffers handed to the device
    pub buffers_played: u64,
    /// Device callbacks answered with silence on an empty ring
    pub underruns: u64,
    /// Device callbacks with an unexpected length
    pub size_mismatches: u64,
    /// Frame buffers waiting in the ring
    pub buffered: usize,
}

impl AudioStats {
    pub(crate) fn combine(mix: MixStats, sink: SinkStats, buffered: usize) -> Self {
        Self {
            buffers_mixed: mix.buffers_mixed,
            buffers_dropped: mix.buffers_dropped,
            buffers_played: sink.buffers_played,
            underruns: sink.underruns,
            size_mismatches: sink.size_mismatches,
            buffered,
        }
    }
}
