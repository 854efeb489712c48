//! Ring buffer tests

use std::thread;

use super::*;

fn buffer_of(value: i16, len: usize) -> Vec<AudioFrame> {
    vec![AudioFrame::new(value, -value); len]
}

fn assert_invariants(snapshot: RingSnapshot) {
    assert!(snapshot.count <= snapshot.capacity);
    assert!(snapshot.read_index < snapshot.capacity);
    assert!(snapshot.write_index < snapshot.capacity);
    assert_eq!(
        (snapshot.read_index + snapshot.count) % snapshot.capacity,
        snapshot.write_index
    );
}

#[test]
fn test_capacity_is_clamped() {
    assert_eq!(RingBuffer::new(1, 4).unwrap().capacity(), 3);
    assert_eq!(RingBuffer::new(0, 4).unwrap().capacity(), 3);
    assert_eq!(RingBuffer::new(8, 4).unwrap().capacity(), 8);
    assert_eq!(RingBuffer::new(5000, 4).unwrap().capacity(), 1024);
}

#[test]
fn test_new_ring_is_empty() {
    let ring = RingBuffer::new(4, 8).unwrap();
    let snapshot = ring.snapshot();
    assert_eq!(snapshot.count, 0);
    assert_eq!(snapshot.read_index, 0);
    assert_eq!(snapshot.write_index, 0);
    assert_eq!(snapshot.capacity, 4);
}

#[test]
fn test_fifo_order() {
    let (mut producer, mut consumer) = RingBuffer::new(4, 8).unwrap().split();

    for value in 1..=4 {
        assert!(producer.try_reserve_slot());
        assert!(producer.publish(&buffer_of(value, 8)));
        assert_invariants(producer.snapshot());
    }

    for value in 1..=4 {
        let buffer = consumer.consume().expect("buffer available");
        assert_eq!(buffer.frames(), buffer_of(value, 8).as_slice());
        assert_invariants(consumer.snapshot());
    }
    assert!(consumer.consume().is_none());
}

#[test]
fn test_overrun_leaves_ring_unchanged() {
    let (mut producer, mut consumer) = RingBuffer::new(3, 4).unwrap().split();
    for value in 1..=3 {
        assert!(producer.publish(&buffer_of(value, 4)));
    }

    let before = producer.snapshot();
    assert_eq!(before.count, 3);
    assert!(!producer.try_reserve_slot());
    assert!(!producer.publish(&buffer_of(99, 4)));
    assert_eq!(producer.snapshot(), before);

    // The dropped buffer never shows up downstream
    for value in 1..=3 {
        assert_eq!(consumer.consume().unwrap().frames(), buffer_of(value, 4).as_slice());
    }
    assert!(consumer.consume().is_none());
}

#[test]
fn test_publish_with_skips_fill_when_full() {
    let (mut producer, _consumer) = RingBuffer::new(3, 2).unwrap().split();
    for _ in 0..3 {
        assert!(producer.publish_with(|slot| slot.fill(AudioFrame::mono(1))));
    }
    let mut called = false;
    assert!(!producer.publish_with(|_| called = true));
    assert!(!called);
}

#[test]
fn test_underrun_returns_silence() {
    let (_producer, mut consumer) = RingBuffer::new(3, 4).unwrap().split();
    let mut out = vec![AudioFrame::new(7, 7); 4];
    assert!(!consumer.consume_into(&mut out));
    assert!(out.iter().all(AudioFrame::is_silent));
    assert_eq!(consumer.snapshot().count, 0);
}

#[test]
fn test_indices_wrap_around() {
    let (mut producer, mut consumer) = RingBuffer::new(3, 1).unwrap().split();
    for value in 0..10 {
        assert!(producer.publish(&buffer_of(value, 1)));
        assert_invariants(producer.snapshot());
        assert_eq!(consumer.consume().unwrap().frames()[0].left, value);
        assert_invariants(consumer.snapshot());
    }
    let snapshot = consumer.snapshot();
    assert_eq!(snapshot.read_index, 10 % 3);
    assert_eq!(snapshot.write_index, 10 % 3);
}

#[test]
fn test_short_publish_is_padded() {
    let (mut producer, mut consumer) = RingBuffer::new(3, 4).unwrap().split();
    assert!(producer.publish(&buffer_of(5, 2)));
    let frames = consumer.consume().unwrap();
    assert_eq!(&frames.frames()[..2], buffer_of(5, 2).as_slice());
    assert!(frames.frames()[2..].iter().all(AudioFrame::is_silent));
}

#[test]
fn test_interleaved_publish_and_consume_keep_invariants() {
    let (mut producer, mut consumer) = RingBuffer::new(5, 2).unwrap().split();
    let mut next_in = 0i16;
    let mut next_out = 0i16;

    // Deterministic mix of bursts on both sides
    for round in 0..200usize {
        for _ in 0..(round % 4) {
            if producer.publish(&buffer_of(next_in, 2)) {
                next_in += 1;
            }
        }
        for _ in 0..(round % 3) {
            if let Some(buffer) = consumer.consume() {
                assert_eq!(buffer.frames()[0].left, next_out);
                next_out += 1;
            }
        }
        assert_invariants(producer.snapshot());
    }
}

#[test]
fn test_concurrent_producer_and_consumer_preserve_order() {
    let (mut producer, mut consumer) = RingBuffer::new(4, 16).unwrap().split();
    const TOTAL: i16 = 2_000;

    let writer = thread::spawn(move || {
        let mut value = 0;
        while value < TOTAL {
            if producer.publish(&buffer_of(value, 16)) {
                value += 1;
            } else {
                thread::yield_now();
            }
        }
    });

    let mut expected = 0;
    let mut out = vec![AudioFrame::SILENCE; 16];
    while expected < TOTAL {
        if consumer.consume_into(&mut out) {
            assert!(out.iter().all(|f| *f == AudioFrame::new(expected, -expected)));
            expected += 1;
        } else {
            thread::yield_now();
        }
        assert_invariants(consumer.snapshot());
    }

    writer.join().unwrap();
    assert_eq!(consumer.snapshot().count, 0);
}

#[test]
fn test_zero_length_buffers_are_rejected() {
    assert!(matches!(
        RingBuffer::new(4, 0),
        Err(AudioError::Allocation {
            buffers: 4,
            frames: 0
        })
    ));
}

#[test]
fn test_odd_sized_consume_keeps_buffer_alignment() {
    let (mut producer, mut consumer) = RingBuffer::new(3, 4).unwrap().split();
    assert!(producer.publish(&buffer_of(1, 4)));
    assert!(producer.publish(&buffer_of(2, 4)));

    // A short read still takes the whole first buffer
    let mut short = vec![AudioFrame::SILENCE; 2];
    assert!(consumer.consume_into(&mut short));
    assert_eq!(short, buffer_of(1, 2));
    assert_eq!(consumer.snapshot().count, 1);

    let mut long = vec![AudioFrame::new(9, 9); 6];
    assert!(consumer.consume_into(&mut long));
    assert_eq!(&long[..4], buffer_of(2, 4).as_slice());
    assert!(long[4..].iter().all(AudioFrame::is_silent));
    assert_eq!(consumer.snapshot().count, 0);
}

#[test]
fn test_producer_sees_consumer_progress() {
    let (mut producer, mut consumer) = RingBuffer::new(3, 4).unwrap().split();
    for value in 0..3 {
        assert!(producer.publish(&buffer_of(value, 4)));
    }
    assert!(!producer.try_reserve_slot());

    assert!(consumer.consume().is_some());
    assert!(producer.try_reserve_slot());
    assert_eq!(producer.snapshot().count, 2);
    assert_invariants(producer.snapshot());
}
