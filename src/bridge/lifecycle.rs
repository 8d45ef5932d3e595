//! Bridge lifecycle
//!
//! ANT+ setup, then BLE setup, then the broadcast loop. However the run ends,
//! the ANT+ node is stopped before returning.

use crate::bridge::broadcaster::BroadcastDriver;
use crate::domain::heart_rate::HeartRateState;
use crate::infrastructure::ant::{AntReceiver, AntTransport, ReceiverConfig};
use crate::infrastructure::ble::protocol::{heart_rate_service, Advertisement};
use crate::infrastructure::ble::BlePeripheral;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything the bridge needs besides its two transports
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub receiver: ReceiverConfig,
    pub advertisement: Advertisement,
    pub broadcast_interval: Duration,
}

pub struct Bridge<A: AntTransport, P: BlePeripheral> {
    config: BridgeConfig,
    state: Arc<HeartRateState>,
    ant: A,
    ant_started: bool,
    driver: BroadcastDriver<P>,
}

impl<A: AntTransport, P: BlePeripheral> Bridge<A, P> {
    pub fn new(config: BridgeConfig, ant: A, peripheral: P) -> Self {
        let state = Arc::new(HeartRateState::new());
        let driver = BroadcastDriver::new(state.clone(), peripheral, config.broadcast_interval);
        Self {
            config,
            state,
            ant,
            ant_started: false,
            driver,
        }
    }

    pub fn state(&self) -> &Arc<HeartRateState> {
        &self.state
    }

    /// Set up both radios and broadcast until `cancel` fires
    ///
    /// Setup failures are returned as errors. Cancellation is a clean exit.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        let result = self.start_and_broadcast(cancel).await;
        if let Err(e) = &result {
            error!("Error in bridge application: {:#}", e);
        }
        self.shutdown();
        result
    }

    async fn start_and_broadcast(&mut self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Cancelled during setup");
                return Ok(());
            }
            result = self.start() => result?,
        }

        self.driver.run(cancel).await;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        // Step 1: ANT+ receiver
        let receiver = Arc::new(AntReceiver::new(self.state.clone()));
        self.ant_started = true;
        receiver
            .setup(&mut self.ant, &self.config.receiver)
            .context("ANT+ setup failed")?;

        // Step 2: BLE peripheral
        let peripheral = self.driver.peripheral_mut();
        peripheral
            .register_service(&heart_rate_service())
            .await
            .context("Failed to register Heart Rate Service")?;
        peripheral
            .start_advertising(&self.config.advertisement)
            .await
            .context("Failed to start advertising")?;

        info!("Bluetooth LE peripheral started and advertising as Heart Rate Monitor");
        Ok(())
    }

    fn shutdown(&mut self) {
        info!("Shutting down...");
        if !self.ant_started {
            return;
        }
        self.ant_started = false;
        if let Err(e) = self.ant.stop() {
            warn!("Failed to stop ANT+ node: {}", e);
        }
    }
}
