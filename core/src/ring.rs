//! Frame-buffer ring shared between the render loop and the audio callback
//!
//! A `ringbuf` heap ring of stereo frames, sized to hold a whole number of
//! frame buffers and split into exactly one [`FrameProducer`] and one
//! [`FrameConsumer`]. Neither handle is `Clone`, so the single-producer
//! assumption behind check-then-publish is enforced by the type system.
//!
//! Buffers move as units: the producer pushes only when a whole buffer of
//! space is vacant, the consumer pops only when a whole buffer is occupied.
//! `push_slice`/`pop_slice` advance the shared index once per call, so the
//! other side never observes a partial buffer.

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::error::AudioError;
use crate::frame::{AudioFrame, FrameBuffer};

/// Fewest frame buffers a ring may hold
pub const MIN_BUFFER_COUNT: usize = 3;

/// Most frame buffers a ring may hold
pub const MAX_BUFFER_COUNT: usize = 1024;

/// Clamp a requested buffer count into `[MIN_BUFFER_COUNT, MAX_BUFFER_COUNT]`
pub fn clamp_buffer_count(requested: usize) -> usize {
    requested.clamp(MIN_BUFFER_COUNT, MAX_BUFFER_COUNT)
}

/// Point-in-time view of the ring bookkeeping, in frame buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSnapshot {
    pub read_index: usize,
    pub write_index: usize,
    pub count: usize,
    pub capacity: usize,
}

/// Fixed-capacity ring of frame buffers
pub struct RingBuffer {
    rb: HeapRb<AudioFrame>,
    capacity: usize,
    frames_per_buffer: usize,
}

impl RingBuffer {
    /// Allocate a ring of `capacity` buffers of `frames_per_buffer` frames each
    ///
    /// `capacity` is clamped to `[MIN_BUFFER_COUNT, MAX_BUFFER_COUNT]`. All
    /// storage is allocated up front; nothing allocates after this returns.
    pub fn new(capacity: usize, frames_per_buffer: usize) -> Result<Self, AudioError> {
        let capacity = clamp_buffer_count(capacity);
        let alloc_error = || AudioError::Allocation {
            buffers: capacity,
            frames: frames_per_buffer,
        };

        let total = capacity
            .checked_mul(frames_per_buffer)
            .filter(|&total| total > 0)
            .ok_or_else(alloc_error)?;
        let rb = HeapRb::try_new(total).map_err(|_| alloc_error())?;

        Ok(Self {
            rb,
            capacity,
            frames_per_buffer,
        })
    }

    /// Split into the producer and consumer handles
    pub fn split(self) -> (FrameProducer, FrameConsumer) {
        let Self {
            rb,
            capacity,
            frames_per_buffer,
        } = self;
        let (prod, cons) = rb.split();
        (
            FrameProducer {
                prod,
                staging: FrameBuffer::silent(frames_per_buffer),
                written: 0,
                capacity,
                frames_per_buffer,
            },
            FrameConsumer {
                cons,
                staging: FrameBuffer::silent(frames_per_buffer),
                read: 0,
                capacity,
                frames_per_buffer,
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frames_per_buffer(&self) -> usize {
        self.frames_per_buffer
    }

    pub fn snapshot(&self) -> RingSnapshot {
        RingSnapshot {
            read_index: 0,
            write_index: 0,
            count: self.rb.occupied_len() / self.frames_per_buffer,
            capacity: self.capacity,
        }
    }
}

/// Copy `src` into `dst`, silencing any frames `src` does not cover
fn copy_frames(dst: &mut [AudioFrame], src: &[AudioFrame]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    dst[n..].fill(AudioFrame::SILENCE);
}

/// Render-side handle: pushes whole frame buffers
pub struct FrameProducer {
    prod: HeapProd<AudioFrame>,
    /// Buffer being filled before it is pushed
    staging: FrameBuffer,
    /// Buffers pushed since the split
    written: usize,
    capacity: usize,
    frames_per_buffer: usize,
}

impl FrameProducer {
    /// Whether a whole buffer of space is vacant right now
    ///
    /// Only the consumer can change the answer from here on, and it only ever
    /// frees space, so a `true` stays valid until this producer publishes.
    pub fn try_reserve_slot(&self) -> bool {
        self.prod.vacant_len() >= self.frames_per_buffer
    }

    /// Fill the next buffer through `fill`, then publish it
    ///
    /// Returns `false` without calling `fill` if the ring is full.
    pub fn publish_with(&mut self, fill: impl FnOnce(&mut [AudioFrame])) -> bool {
        if !self.try_reserve_slot() {
            return false;
        }

        fill(self.staging.frames_mut());
        let pushed = self.prod.push_slice(self.staging.frames());
        debug_assert_eq!(pushed, self.frames_per_buffer);
        self.written = self.written.wrapping_add(1);
        true
    }

    /// Copy `frames` into the next buffer and publish it
    ///
    /// A short input is padded with silence; a long one is truncated to the
    /// ring's frame-buffer length.
    pub fn publish(&mut self, frames: &[AudioFrame]) -> bool {
        self.publish_with(|slot| copy_frames(slot, frames))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frames_per_buffer(&self) -> usize {
        self.frames_per_buffer
    }

    pub fn snapshot(&self) -> RingSnapshot {
        let count = self.prod.occupied_len() / self.frames_per_buffer;
        let write_index = self.written % self.capacity;
        RingSnapshot {
            read_index: (write_index + self.capacity - count) % self.capacity,
            write_index,
            count,
            capacity: self.capacity,
        }
    }
}

/// Callback-side handle: pops whole frame buffers
pub struct FrameConsumer {
    cons: HeapCons<AudioFrame>,
    /// Landing buffer when the caller's slice is not one buffer long
    staging: FrameBuffer,
    /// Buffers popped since the split
    read: usize,
    capacity: usize,
    frames_per_buffer: usize,
}

impl FrameConsumer {
    /// Copy the oldest buffer into `out` and release its space
    ///
    /// On underrun `out` is filled with silence and `false` is returned.
    pub fn consume_into(&mut self, out: &mut [AudioFrame]) -> bool {
        if self.cons.occupied_len() < self.frames_per_buffer {
            out.fill(AudioFrame::SILENCE);
            return false;
        }

        let popped = if out.len() == self.frames_per_buffer {
            self.cons.pop_slice(out)
        } else {
            let popped = self.cons.pop_slice(self.staging.frames_mut());
            copy_frames(out, self.staging.frames());
            popped
        };
        debug_assert_eq!(popped, self.frames_per_buffer);
        self.read = self.read.wrapping_add(1);
        true
    }

    /// Take the oldest buffer as an owned copy, or `None` on underrun
    ///
    /// Allocates; the audio callback uses [`FrameConsumer::consume_into`].
    pub fn consume(&mut self) -> Option<FrameBuffer> {
        let mut buffer = FrameBuffer::silent(self.frames_per_buffer);
        self.consume_into(buffer.frames_mut()).then_some(buffer)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frames_per_buffer(&self) -> usize {
        self.frames_per_buffer
    }

    pub fn snapshot(&self) -> RingSnapshot {
        let count = self.cons.occupied_len() / self.frames_per_buffer;
        let read_index = self.read % self.capacity;
        RingSnapshot {
            read_index,
            write_index: (read_index + count) % self.capacity,
            count,
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests;
