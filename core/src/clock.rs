//! CPU clock to audio clock conversion
//!
//! The emulated CPU runs at 8 MHz and the VERA chip at 25 MHz. Cycles are
//! converted in two integer stages so no fractional time is ever lost:
//!
//! ```text
//! cpu cycles ──(÷8)──► 1 MHz steps ──(×25)──► VERA clocks ──(÷512·N)──► triggers
//! ```
//!
//! Each trigger means one frame buffer (N frames) of audio time has elapsed.

use crate::frame::VERA_CLOCKS_PER_SAMPLE;

/// CPU cycles per 1 MHz step
pub const CPU_CYCLES_PER_STEP: u64 = 8;

/// VERA clocks per 1 MHz step
pub const VERA_CLOCKS_PER_STEP: u64 = 25;

/// Converts elapsed CPU cycles into frame-buffer render triggers
///
/// Both accumulators stay below their divisors between calls, so the
/// long-run trigger count depends only on the total cycles fed in, never
/// on how they were chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockConverter {
    /// CPU cycles not yet converted to a whole step (always < 8)
    cpu_remainder: u64,
    /// VERA clocks not yet converted to a whole frame buffer
    vera_remainder: u64,
    /// VERA clocks per frame buffer
    vera_clocks_per_buffer: u64,
}

impl ClockConverter {
    pub fn new(frames_per_buffer: usize) -> Self {
        debug_assert!(frames_per_buffer > 0);
        Self {
            cpu_remainder: 0,
            vera_remainder: 0,
            vera_clocks_per_buffer: frames_per_buffer as u64 * VERA_CLOCKS_PER_SAMPLE as u64,
        }
    }

    /// Feed elapsed CPU cycles, returning how many frame buffers are due
    ///
    /// Any `u64` cycle count is accepted; intermediates are widened so the
    /// accumulators cannot overflow. A trigger count beyond `usize::MAX`
    /// (32-bit hosts only) saturates.
    pub fn advance(&mut self, cpu_cycles: u64) -> usize {
        let pending = self.cpu_remainder as u128 + cpu_cycles as u128;
        let steps = pending / CPU_CYCLES_PER_STEP as u128;
        self.cpu_remainder = (pending % CPU_CYCLES_PER_STEP as u128) as u64;

        let per_buffer = self.vera_clocks_per_buffer as u128;
        let clocks = self.vera_remainder as u128 + steps * VERA_CLOCKS_PER_STEP as u128;
        self.vera_remainder = (clocks % per_buffer) as u64;
        usize::try_from(clocks / per_buffer).unwrap_or(usize::MAX)
    }

    /// Drop all accumulated time
    pub fn reset(&mut self) {
        self.cpu_remainder = 0;
        self.vera_remainder = 0;
    }

    pub fn cpu_remainder(&self) -> u64 {
        self.cpu_remainder
    }

    pub fn vera_remainder(&self) -> u64 {
        self.vera_remainder
    }

    pub fn vera_clocks_per_buffer(&self) -> u64 {
        self.vera_clocks_per_buffer
    }
}

/// VERA clocks produced by `cpu_cycles` fed in from a zeroed converter
///
/// Saturates at `u64::MAX`.
pub fn vera_clocks_for(cpu_cycles: u64) -> u64 {
    (cpu_cycles / CPU_CYCLES_PER_STEP).saturating_mul(VERA_CLOCKS_PER_STEP)
}
