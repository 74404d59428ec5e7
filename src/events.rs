//! Real-time safe event log.
//!
//! The audio thread must not format strings, lock or touch a logger. It
//! pushes small `Copy` events into a pre-allocated SPSC ring instead, and a
//! non-real-time thread drains them into the `log` facade. When the ring is
//! full the event is dropped.

use ringbuf::{Consumer, Producer, RingBuffer};

const EVENT_CAP: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipelineEvent {
    /// The noise profile is seeded and suppression is now active.
    CalibrationComplete {
        hops: u64,
        samples: u64,
        noise_floor_db: f32,
    },
    /// Non-finite input samples were replaced with silence.
    NonFiniteInput { hop: u64, samples: usize },
    /// A filter or transform overflowed; the hop was replaced with silence.
    NumericOverflow { hop: u64 },
}

/// Audio-thread half.
pub struct EventSink {
    producer: Producer<PipelineEvent>,
}

/// Reader half, owned by whoever logs.
pub struct EventDrain {
    consumer: Consumer<PipelineEvent>,
}

pub fn event_channel() -> (EventSink, EventDrain) {
    let (producer, consumer) = RingBuffer::<PipelineEvent>::new(EVENT_CAP).split();
    (EventSink { producer }, EventDrain { consumer })
}

impl EventSink {
    #[inline]
    pub fn push(&mut self, event: PipelineEvent) {
        let _ = self.producer.push(event);
    }
}

impl EventDrain {
    pub fn pop(&mut self) -> Option<PipelineEvent> {
        self.consumer.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Forwards every pending event to the `log` facade and returns how many
    /// were written.
    pub fn drain_to_log(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.consumer.pop() {
            match event {
                PipelineEvent::CalibrationComplete {
                    hops,
                    samples,
                    noise_floor_db,
                } => log::info!(
                    "calibration done after {} hops ({} samples), noise floor {:.1} dB",
                    hops,
                    samples,
                    noise_floor_db
                ),
                PipelineEvent::NonFiniteInput { hop, samples } => log::warn!(
                    "hop {}: replaced {} non-finite input samples with silence",
                    hop,
                    samples
                ),
                PipelineEvent::NumericOverflow { hop } => log::warn!(
                    "hop {}: numeric overflow, hop replaced with silence",
                    hop
                ),
            }
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let (mut sink, mut drain) = event_channel();
        sink.push(PipelineEvent::NonFiniteInput { hop: 3, samples: 2 });
        sink.push(PipelineEvent::CalibrationComplete {
            hops: 100,
            samples: 16_000,
            noise_floor_db: -60.0,
        });
        assert_eq!(
            drain.pop(),
            Some(PipelineEvent::NonFiniteInput { hop: 3, samples: 2 })
        );
        assert!(matches!(
            drain.pop(),
            Some(PipelineEvent::CalibrationComplete { hops: 100, .. })
        ));
        assert!(drain.is_empty());
    }

    #[test]
    fn test_full_ring_drops_instead_of_blocking() {
        let (mut sink, mut drain) = event_channel();
        for hop in 0..(EVENT_CAP as u64 * 2) {
            sink.push(PipelineEvent::NonFiniteInput { hop, samples: 1 });
        }
        assert_eq!(drain.drain_to_log(), EVENT_CAP);
    }
}
