//! Per-characteristic sequence counters

use std::sync::atomic::{AtomicU8, Ordering};

use crate::codec::Destination;

/// One wrapping `u8` counter per destination characteristic.
///
/// Counters are bumped before encoding, so the first frame sent to a
/// characteristic carries 1. They are never reset for the lifetime of the
/// owning session.
#[derive(Debug, Default)]
pub struct SequenceCounters {
    movement: AtomicU8,
    maneuver: AtomicU8,
    emergency: AtomicU8,
}

impl SequenceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, destination: Destination) -> &AtomicU8 {
        match destination {
            Destination::Movement => &self.movement,
            Destination::Maneuver => &self.maneuver,
            Destination::Emergency => &self.emergency,
        }
    }

    /// Increment the destination's counter and return the new value
    pub fn next(&self, destination: Destination) -> u8 {
        // fetch_add wraps on overflow
        self.counter(destination)
            .fetch_add(1, Ordering::SeqCst)
            .wrapping_add(1)
    }

    /// Last value handed out for the destination
    pub fn current(&self, destination: Destination) -> u8 {
        self.counter(destination).load(Ordering::SeqCst)
    }
}
