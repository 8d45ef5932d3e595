use std::time::Instant;

/// A heart rate decoded from an ANT+ broadcast, guaranteed non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRateReading(u8);

impl HeartRateReading {
    /// Returns `None` for 0, which the sensor uses while it has no reading
    pub fn new(bpm: u8) -> Option<Self> {
        if bpm == 0 {
            None
        } else {
            Some(Self(bpm))
        }
    }

    pub fn bpm(&self) -> u8 {
        self.0
    }
}

/// Copy of the shared heart-rate cell at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartRateMeasurement {
    /// Beats per minute, 0 while no valid reading has been seen
    pub bpm: u8,
    /// When the current `bpm` was received (monotonic clock)
    pub received_at: Option<Instant>,
}

impl HeartRateMeasurement {
    pub fn is_valid(&self) -> bool {
        self.bpm != 0
    }

    pub fn broadcast_state(&self) -> BroadcastState {
        if self.is_valid() {
            BroadcastState::Broadcasting
        } else {
            BroadcastState::Idle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastState {
    /// No valid reading seen yet, ticks push nothing
    Idle,
    /// A reading is present, every tick pushes it
    Broadcasting,
}
