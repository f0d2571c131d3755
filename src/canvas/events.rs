//! Lock-free gesture feed
//!
//! An SPSC (single producer, single consumer) ring buffer carrying gesture
//! events from a platform input callback to the canvas owner.
//!
//! Architecture:
//! - Producer (input callback): never blocks; a full buffer drops the event
//!   and counts the drop
//! - Consumer (session thread): drains events in batches and applies them to
//!   the canvas
//!
//! The core ring is the `rtrb` crate; this wrapper adds sequence numbers and
//! monitoring counters.

use super::types::GestureEvent;
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default ring buffer capacity (must be a power of 2)
pub const DEFAULT_CAPACITY: usize = 1024;

/// A gesture event with its feed sequence number
#[derive(Debug, Clone, Copy)]
pub struct GestureSlot {
    pub event: GestureEvent,
    /// Position in the feed, for ordering verification
    pub sequence: u64,
}

/// Ring buffer statistics for monitoring
#[derive(Debug, Default)]
pub struct GestureStats {
    /// Total events pushed
    pub events_pushed: AtomicU64,
    /// Events dropped due to a full buffer
    pub events_dropped: AtomicU64,
    /// Events successfully consumed
    pub events_consumed: AtomicU64,
    /// Peak buffer occupancy
    pub peak_occupancy: AtomicU64,
}

/// Lock-free ring buffer for gesture events.
///
/// Connects the input side (producer) to the drawing session (consumer).
pub struct GestureRingBuffer {
    producer: Option<Producer<GestureSlot>>,
    consumer: Option<Consumer<GestureSlot>>,
    sequence: AtomicU64,
    stats: Arc<GestureStats>,
    capacity: usize,
}

impl GestureRingBuffer {
    /// Create a ring buffer with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a ring buffer with the given capacity
    ///
    /// # Panics
    /// Panics if `capacity` is not a power of 2
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Ring buffer capacity must be a power of 2"
        );

        let (producer, consumer) = RingBuffer::new(capacity);
        Self {
            producer: Some(producer),
            consumer: Some(consumer),
            sequence: AtomicU64::new(0),
            stats: Arc::new(GestureStats::default()),
            capacity,
        }
    }

    /// Split into producer and consumer halves.
    ///
    /// Called once to hand the producer to the input side and the consumer to
    /// the session.
    pub fn split(mut self) -> (GestureProducer, GestureConsumer) {
        let producer = self.producer.take().expect("Producer already taken");
        let consumer = self.consumer.take().expect("Consumer already taken");

        (
            GestureProducer {
                inner: producer,
                sequence: Arc::new(self.sequence),
                stats: Arc::clone(&self.stats),
                capacity: self.capacity,
            },
            GestureConsumer {
                inner: consumer,
                stats: Arc::clone(&self.stats),
            },
        )
    }

    /// Get the shared statistics handle
    pub fn stats(&self) -> Arc<GestureStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for GestureRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half (for the input callback)
pub struct GestureProducer {
    inner: Producer<GestureSlot>,
    sequence: Arc<AtomicU64>,
    stats: Arc<GestureStats>,
    capacity: usize,
}

impl GestureProducer {
    /// Push a gesture event.
    ///
    /// Lock-free and never blocks. When the buffer is full the event is
    /// dropped and counted; returns whether the event was accepted.
    #[inline]
    pub fn push(&mut self, event: GestureEvent) -> bool {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let slot = GestureSlot { event, sequence };

        match self.inner.push(slot) {
            Ok(()) => {
                self.stats.events_pushed.fetch_add(1, Ordering::Relaxed);

                // Update peak occupancy
                let occupied = (self.capacity - self.inner.slots()) as u64;
                let mut peak = self.stats.peak_occupancy.load(Ordering::Relaxed);
                while occupied > peak {
                    match self.stats.peak_occupancy.compare_exchange_weak(
                        peak,
                        occupied,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(p) => peak = p,
                    }
                }

                true
            }
            Err(_) => {
                self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
                // Roll back the sequence so the feed stays gap-free
                self.sequence.fetch_sub(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Free slots remaining in the buffer
    #[inline]
    pub fn available_slots(&self) -> usize {
        self.inner.slots()
    }

    /// Check if the buffer is full
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }
}

/// Consumer half (for the drawing session)
pub struct GestureConsumer {
    inner: Consumer<GestureSlot>,
    stats: Arc<GestureStats>,
}

impl GestureConsumer {
    /// Pop the next event, if any
    #[inline]
    pub fn pop(&mut self) -> Option<GestureSlot> {
        match self.inner.pop() {
            Ok(slot) => {
                self.stats.events_consumed.fetch_add(1, Ordering::Relaxed);
                Some(slot)
            }
            Err(_) => None,
        }
    }

    /// Pop up to `max` events in feed order
    pub fn pop_batch(&mut self, max: usize) -> Vec<GestureSlot> {
        let mut batch = Vec::with_capacity(max.min(self.inner.slots()));
        while batch.len() < max {
            match self.pop() {
                Some(slot) => batch.push(slot),
                None => break,
            }
        }
        batch
    }

    /// Events waiting in the buffer
    #[inline]
    pub fn pending(&self) -> usize {
        self.inner.slots()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
