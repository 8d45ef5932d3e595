//! Periodic BLE broadcast driver
//!
//! Every tick reads the shared state and, once a valid reading exists,
//! pushes it as a Heart Rate Measurement notification.

use crate::domain::heart_rate::HeartRateState;
use crate::domain::models::BroadcastState;
use crate::infrastructure::ble::protocol::{
    encode_measurement, BleMeasurementFrame, HEART_RATE_MEASUREMENT_UUID,
};
use crate::infrastructure::ble::BlePeripheral;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Default time between notifications
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(1);

/// Result of one broadcast tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Idle, nothing pushed
    Skipped,
    Sent(BleMeasurementFrame),
    /// The peripheral rejected the update
    Failed,
}

pub struct BroadcastDriver<P> {
    state: Arc<HeartRateState>,
    peripheral: P,
    interval: Duration,
}

impl<P: BlePeripheral> BroadcastDriver<P> {
    pub fn new(state: Arc<HeartRateState>, peripheral: P, interval: Duration) -> Self {
        Self {
            state,
            peripheral,
            interval,
        }
    }

    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// Run one broadcast step
    pub async fn tick(&mut self) -> TickOutcome {
        let measurement = self.state.snapshot();
        if measurement.broadcast_state() == BroadcastState::Idle {
            return TickOutcome::Skipped;
        }

        let frame = encode_measurement(measurement.bpm);
        match self
            .peripheral
            .notify(HEART_RATE_MEASUREMENT_UUID, frame.as_bytes())
            .await
        {
            Ok(()) => {
                debug!("Updated heart rate characteristic: {} BPM", frame.bpm());
                TickOutcome::Sent(frame)
            }
            Err(e) => {
                error!("Error updating heart rate characteristic: {}", e);
                TickOutcome::Failed
            }
        }
    }

    /// Tick until `cancel` fires
    ///
    /// The first tick happens immediately. A slow push delays the following
    /// ticks instead of bunching them up.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Broadcasting heart rate every {:?}", self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // Cancellation also interrupts a push in progress
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.tick() => {}
                    }
                }
            }
        }

        info!("Broadcast loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::HeartRateReading;
    use crate::infrastructure::ble::peripheral::mock::MockPeripheral;

    fn driver() -> (Arc<HeartRateState>, MockPeripheral, BroadcastDriver<MockPeripheral>) {
        let state = Arc::new(HeartRateState::new());
        let peripheral = MockPeripheral::new();
        let driver = BroadcastDriver::new(
            state.clone(),
            peripheral.clone(),
            DEFAULT_BROADCAST_INTERVAL,
        );
        (state, peripheral, driver)
    }

    fn record(state: &HeartRateState, bpm: u8) {
        state.record_now(HeartRateReading::new(bpm).unwrap());
    }

    #[tokio::test]
    async fn test_cold_start_sends_nothing() {
        let (_, peripheral, mut driver) = driver();
        assert_eq!(driver.tick().await, TickOutcome::Skipped);
        assert!(peripheral.pushed_values().is_empty());
    }

    #[tokio::test]
    async fn test_first_reading_is_pushed() {
        let (state, peripheral, mut driver) = driver();
        record(&state, 72);

        assert_eq!(
            driver.tick().await,
            TickOutcome::Sent(encode_measurement(72))
        );
        let recorded = peripheral.recorded.lock().unwrap();
        assert_eq!(
            recorded.notifications,
            vec![(HEART_RATE_MEASUREMENT_UUID, vec![0x00, 0x48])]
        );
    }

    #[tokio::test]
    async fn test_unchanged_state_resends_identical_bytes() {
        let (state, peripheral, mut driver) = driver();
        record(&state, 72);

        driver.tick().await;
        driver.tick().await;
        driver.tick().await;

        assert_eq!(peripheral.pushed_values(), vec![vec![0x00, 0x48]; 3]);
    }

    #[tokio::test]
    async fn test_push_failure_is_survived() {
        let (state, peripheral, mut driver) = driver();
        record(&state, 72);
        peripheral.fail_next_notifies(1);

        assert_eq!(driver.tick().await, TickOutcome::Failed);

        record(&state, 85);
        assert_eq!(
            driver.tick().await,
            TickOutcome::Sent(encode_measurement(85))
        );
        assert_eq!(peripheral.pushed_values(), vec![vec![0x00, 0x55]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_on_interval() {
        let (state, peripheral, mut driver) = driver();
        record(&state, 60);
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            // Ticks at 0s, 1s, 2s; cancelled before the 3s tick
            tokio::time::sleep(Duration::from_millis(2500)).await;
            stopper.cancel();
        });

        driver.run(&cancel).await;
        assert_eq!(peripheral.pushed_values().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_without_waiting_out_interval() {
        let state = Arc::new(HeartRateState::new());
        let mut driver = BroadcastDriver::new(
            state,
            MockPeripheral::new(),
            Duration::from_secs(3600),
        );
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            stopper.cancel();
        });

        let start = tokio::time::Instant::now();
        driver.run(&cancel).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_picks_up_later_readings() {
        let (state, peripheral, mut driver) = driver();
        let cancel = CancellationToken::new();

        let writer_state = state.clone();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            // Idle for the ticks at 0s and 1s
            tokio::time::sleep(Duration::from_millis(1500)).await;
            record(&writer_state, 72);
            tokio::time::sleep(Duration::from_millis(1000)).await;
            record(&writer_state, 85);
            tokio::time::sleep(Duration::from_millis(1000)).await;
            stopper.cancel();
        });

        driver.run(&cancel).await;
        assert_eq!(
            peripheral.pushed_values(),
            vec![vec![0x00, 0x48], vec![0x00, 0x55]]
        );
    }
}
