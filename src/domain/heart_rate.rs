//! Shared Heart-Rate State
//!
//! The one cell written by the ANT+ receiver and read by the BLE broadcaster.
//! Writes arrive on the transport's listener thread, reads on the broadcast
//! task, so both fields sit behind a single mutex and are always seen as a pair.

use crate::domain::models::{BroadcastState, HeartRateMeasurement, HeartRateReading};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct HeartRateState {
    inner: Mutex<HeartRateMeasurement>,
}

impl HeartRateState {
    /// Create an empty (Idle) state
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reading received at `at`
    ///
    /// `received_at` never moves backwards: an `at` older than the stored
    /// timestamp is replaced by the stored one. Last write wins for `bpm`.
    pub fn record(&self, reading: HeartRateReading, at: Instant) {
        let mut current = self.lock();
        let received_at = match current.received_at {
            Some(previous) if previous > at => previous,
            _ => at,
        };
        *current = HeartRateMeasurement {
            bpm: reading.bpm(),
            received_at: Some(received_at),
        };
    }

    /// Store a reading received now
    pub fn record_now(&self, reading: HeartRateReading) {
        self.record(reading, Instant::now());
    }

    pub fn snapshot(&self) -> HeartRateMeasurement {
        *self.lock()
    }

    pub fn broadcast_state(&self) -> BroadcastState {
        self.snapshot().broadcast_state()
    }

    // A writer cannot leave the pair half-updated, so a poisoned lock still holds valid data.
    fn lock(&self) -> MutexGuard<'_, HeartRateMeasurement> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
