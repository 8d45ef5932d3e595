//! ANT+ Receiver
//!
//! Opens the HRM channel and writes every valid decoded heart rate into the
//! shared state.

use crate::domain::heart_rate::HeartRateState;
use crate::infrastructure::ant::protocol::{
    self, ChannelId, ChannelType, NetworkKey, ANT_PLUS_NETWORK, HRM_CHANNEL,
};
use crate::infrastructure::ant::transport::{AntError, AntTransport, FrameHandler};
use std::sync::Arc;
use tracing::{info, trace};

/// Configuration for pairing with the sensor
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// ANT+ device number of the sensor (0 = any)
    pub device_number: u16,
    pub network_key: NetworkKey,
}

/// Decodes inbound HRM frames into the shared state
pub struct AntReceiver {
    state: Arc<HeartRateState>,
}

impl AntReceiver {
    pub fn new(state: Arc<HeartRateState>) -> Self {
        Self { state }
    }

    /// Decode one frame and store the reading if it is valid
    ///
    /// Returns whether the state was updated.
    pub fn handle_frame(&self, data: &[u8]) -> bool {
        match protocol::decode_broadcast(data) {
            Some(reading) => {
                self.state.record_now(reading);
                info!("Heart rate received: {} BPM", reading.bpm());
                true
            }
            None => {
                trace!("Ignoring ANT+ frame: {:02X?}", data);
                false
            }
        }
    }

    /// Configure the HRM channel and register the receiver with the transport
    ///
    /// Any failure here is fatal for the bridge.
    pub fn setup<T: AntTransport>(
        self: Arc<Self>,
        transport: &mut T,
        config: &ReceiverConfig,
    ) -> Result<(), AntError> {
        // Step 1: Query the USB stick
        let capabilities = transport.capabilities()?;
        info!(
            "USB stick capabilities: {} channels, {} networks",
            capabilities.max_channels, capabilities.max_networks
        );

        // Step 2: Network key
        transport.set_network_key(ANT_PLUS_NETWORK, &config.network_key)?;

        // Step 3: Receive-only slave channel paired to the HRM
        transport.assign_channel(HRM_CHANNEL, ChannelType::SlaveReceiveOnly, ANT_PLUS_NETWORK)?;
        transport.set_channel_id(
            HRM_CHANNEL,
            ChannelId::heart_rate_monitor(config.device_number),
        )?;

        // Step 4: Open and start receiving
        transport.open_channel(HRM_CHANNEL, self)?;

        info!(
            "Listening for ANT+ HRM with device ID: {}",
            config.device_number
        );
        Ok(())
    }
}

impl FrameHandler for AntReceiver {
    fn on_broadcast(&self, data: &[u8]) {
        self.handle_frame(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::BroadcastState;
    use crate::infrastructure::ant::protocol::ANT_PLUS_NETWORK_KEY;
    use crate::infrastructure::ant::transport::mock::{Call, MockAntTransport};

    fn receiver() -> (Arc<HeartRateState>, AntReceiver) {
        let state = Arc::new(HeartRateState::new());
        (state.clone(), AntReceiver::new(state))
    }

    #[test]
    fn test_valid_frame_updates_state() {
        let (state, receiver) = receiver();
        assert!(receiver.handle_frame(&[0x00, 0x48, 0x00, 0x00, 0x00]));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.bpm, 72);
        assert!(snapshot.received_at.is_some());
        assert_eq!(snapshot.broadcast_state(), BroadcastState::Broadcasting);
    }

    #[test]
    fn test_short_frame_leaves_state_unchanged() {
        let (state, receiver) = receiver();
        assert!(!receiver.handle_frame(&[0x00, 0x48, 0x00]));
        assert_eq!(state.snapshot().bpm, 0);
        assert_eq!(state.snapshot().received_at, None);
    }

    #[test]
    fn test_zero_after_valid_keeps_last_reading() {
        let (state, receiver) = receiver();
        receiver.handle_frame(&[0x00, 0x48, 0x00, 0x00, 0x00]);
        let before = state.snapshot();

        assert!(!receiver.handle_frame(&[0x01, 0x00, 0x00, 0x00, 0x00]));
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_every_nonzero_value_is_stored() {
        let (state, receiver) = receiver();
        let mut last = None;
        for bpm in 1..=255u8 {
            receiver.handle_frame(&[0x00, bpm, 0x00, 0x00, 0x00]);
            let snapshot = state.snapshot();
            assert_eq!(snapshot.bpm, bpm);
            if let Some(previous) = last {
                assert!(snapshot.received_at.unwrap() >= previous);
            }
            last = snapshot.received_at;
        }
    }

    #[test]
    fn test_setup_sequence() {
        let (state, receiver) = receiver();
        let mut transport = MockAntTransport::new();
        let config = ReceiverConfig {
            device_number: 12345,
            network_key: ANT_PLUS_NETWORK_KEY,
        };

        Arc::new(receiver).setup(&mut transport, &config).unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                Call::Capabilities,
                Call::SetNetworkKey(0, ANT_PLUS_NETWORK_KEY),
                Call::AssignChannel(0, ChannelType::SlaveReceiveOnly, 0),
                Call::SetChannelId(0, ChannelId::heart_rate_monitor(12345)),
                Call::OpenChannel(0),
            ]
        );

        // Broadcast and burst data both reach the decoder
        transport.deliver(&[0x00, 0x48, 0x00, 0x00, 0x00]);
        assert_eq!(state.snapshot().bpm, 72);
        transport.deliver_burst(&[0x00, 0x55, 0x00, 0x00, 0x00]);
        assert_eq!(state.snapshot().bpm, 85);
    }

    #[test]
    fn test_setup_fails_when_channel_cannot_open() {
        let (_, receiver) = receiver();
        let mut transport = MockAntTransport::failing_open();
        let config = ReceiverConfig {
            device_number: 1,
            network_key: ANT_PLUS_NETWORK_KEY,
        };

        let result = Arc::new(receiver).setup(&mut transport, &config);
        assert!(matches!(result, Err(AntError::CommandRejected { .. })));
    }
}
