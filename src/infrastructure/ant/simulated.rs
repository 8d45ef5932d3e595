//! Simulated ANT+ HRM sensor
//!
//! Stands in for the USB stick when no radio is attached. A background thread
//! emits HRM broadcast pages at the profile's message rate with a drifting
//! heart rate, starting with a few warm-up pages that report 0.

use crate::infrastructure::ant::protocol::{
    Capabilities, ChannelId, ChannelType, NetworkKey, HRM_DEVICE_TYPE,
};
use crate::infrastructure::ant::transport::{AntError, AntTransport, FrameHandler};
use rand::Rng;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// HRM broadcast period (8070 counts of 1/32768 s, about 4.06 Hz)
pub const HRM_MESSAGE_PERIOD: Duration = Duration::from_micros(246_277);

const MAX_CHANNELS: u8 = 8;
const MAX_NETWORKS: u8 = 3;

/// Heart rate range the simulation drifts within
const MIN_BPM: u8 = 55;
const MAX_BPM: u8 = 170;

/// Produces the payload of each simulated HRM page
#[derive(Debug, Clone)]
pub struct HeartRateGenerator {
    bpm: u8,
    beat_count: u8,
    warmup_frames: u32,
}

impl HeartRateGenerator {
    pub fn new(start_bpm: u8, warmup_frames: u32) -> Self {
        Self {
            bpm: start_bpm.clamp(MIN_BPM, MAX_BPM),
            beat_count: 0,
            warmup_frames,
        }
    }

    /// Next 8-byte HRM page: beat count, computed heart rate, page data
    pub fn next_frame<R: Rng>(&mut self, rng: &mut R) -> [u8; 8] {
        if self.warmup_frames > 0 {
            self.warmup_frames -= 1;
            return [self.beat_count, 0, 0, 0, 0, 0, 0, 0];
        }

        let step: i16 = rng.gen_range(-2..=2);
        self.bpm = (self.bpm as i16 + step).clamp(MIN_BPM as i16, MAX_BPM as i16) as u8;
        self.beat_count = self.beat_count.wrapping_add(1);

        [self.beat_count, self.bpm, 0, 0, 0, 0, 0, 0]
    }
}

/// ANT+ transport backed by [`HeartRateGenerator`]
pub struct SimulatedSensor {
    period: Duration,
    start_bpm: u8,
    warmup_frames: u32,
    assigned: Option<u8>,
    channel_id: Option<ChannelId>,
    stop_tx: Option<Sender<()>>,
    listener: Option<JoinHandle<()>>,
}

impl SimulatedSensor {
    pub fn new(warmup_frames: u32) -> Self {
        Self::with_period(HRM_MESSAGE_PERIOD, warmup_frames)
    }

    pub fn with_period(period: Duration, warmup_frames: u32) -> Self {
        Self {
            period,
            start_bpm: 65,
            warmup_frames,
            assigned: None,
            channel_id: None,
            stop_tx: None,
            listener: None,
        }
    }
}

impl AntTransport for SimulatedSensor {
    fn capabilities(&mut self) -> Result<Capabilities, AntError> {
        Ok(Capabilities {
            max_channels: MAX_CHANNELS,
            max_networks: MAX_NETWORKS,
        })
    }

    fn set_network_key(&mut self, network: u8, key: &NetworkKey) -> Result<(), AntError> {
        if network >= MAX_NETWORKS {
            return Err(AntError::CommandRejected {
                command: "set_network_key",
                code: 0x28,
            });
        }
        debug!("Simulated network {} key set to {:?}", network, key);
        Ok(())
    }

    fn assign_channel(
        &mut self,
        channel: u8,
        _channel_type: ChannelType,
        network: u8,
    ) -> Result<(), AntError> {
        if channel >= MAX_CHANNELS || network >= MAX_NETWORKS {
            return Err(AntError::CommandRejected {
                command: "assign_channel",
                code: 0x28,
            });
        }
        self.assigned = Some(channel);
        Ok(())
    }

    fn set_channel_id(&mut self, channel: u8, id: ChannelId) -> Result<(), AntError> {
        if self.assigned != Some(channel) {
            return Err(AntError::ChannelNotAssigned(channel));
        }
        if id.device_type != HRM_DEVICE_TYPE {
            return Err(AntError::CommandRejected {
                command: "set_channel_id",
                code: 0x28,
            });
        }
        self.channel_id = Some(id);
        Ok(())
    }

    fn open_channel(
        &mut self,
        channel: u8,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<(), AntError> {
        if self.assigned != Some(channel) || self.channel_id.is_none() {
            return Err(AntError::ChannelNotAssigned(channel));
        }
        if self.listener.is_some() {
            return Err(AntError::ChannelAlreadyOpen(channel));
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let period = self.period;
        let mut generator = HeartRateGenerator::new(self.start_bpm, self.warmup_frames);

        let listener = std::thread::Builder::new()
            .name("ant-sim".into())
            .spawn(move || {
                let mut rng = rand::thread_rng();
                loop {
                    let frame = generator.next_frame(&mut rng);
                    handler.on_broadcast(&frame);
                    // Wakes as soon as `stop` drops the sender
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;
        self.stop_tx = Some(stop_tx);
        self.listener = Some(listener);

        info!("Simulated HRM sensor broadcasting on channel {}", channel);
        Ok(())
    }

    /// Stop the listener thread
    ///
    /// The thread is woken immediately, so the join only waits for a frame
    /// already being delivered.
    fn stop(&mut self) -> Result<(), AntError> {
        self.stop_tx.take();
        if let Some(listener) = self.listener.take() {
            listener.join().map_err(|_| AntError::ListenerPanicked)?;
            info!("Simulated HRM sensor stopped");
        }
        Ok(())
    }
}
