//! ANT+ Transport Abstraction
//!
//! The USB stick driver lives behind [`AntTransport`]. It owns its listener
//! thread and hands inbound frames to a [`FrameHandler`] registered when the
//! channel is opened.

use crate::infrastructure::ant::protocol::{Capabilities, ChannelId, ChannelType, NetworkKey};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by an ANT+ transport
#[derive(Debug, Error)]
pub enum AntError {
    #[error("ANT USB device not found")]
    DeviceNotFound,
    #[error("channel {0} is not assigned")]
    ChannelNotAssigned(u8),
    #[error("channel {0} is already open")]
    ChannelAlreadyOpen(u8),
    #[error("command {command} rejected with code {code:#04X}")]
    CommandRejected { command: &'static str, code: u8 },
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("listener thread panicked")]
    ListenerPanicked,
}

/// Receives frames from the transport's listener
///
/// Called from the transport's own thread, so implementations must not block.
pub trait FrameHandler: Send + Sync {
    fn on_broadcast(&self, data: &[u8]);

    /// Burst data is handled like broadcast data unless overridden
    fn on_burst(&self, data: &[u8]) {
        self.on_broadcast(data);
    }
}

/// One-time setup commands and shutdown for an ANT+ node
pub trait AntTransport: Send {
    /// Query the stick's channel and network limits
    fn capabilities(&mut self) -> Result<Capabilities, AntError>;

    fn set_network_key(&mut self, network: u8, key: &NetworkKey) -> Result<(), AntError>;

    fn assign_channel(
        &mut self,
        channel: u8,
        channel_type: ChannelType,
        network: u8,
    ) -> Result<(), AntError>;

    fn set_channel_id(&mut self, channel: u8, id: ChannelId) -> Result<(), AntError>;

    /// Open the channel and start delivering frames to `handler`
    fn open_channel(&mut self, channel: u8, handler: Arc<dyn FrameHandler>)
        -> Result<(), AntError>;

    /// Stop the node and its listener
    fn stop(&mut self) -> Result<(), AntError>;
}
