//! Bridge Module
//!
//! Connects the ANT+ receiver to the BLE peripheral.
//!
//! ```text
//! ANT+ sensor ──► AntReceiver ──► HeartRateState ──► BroadcastDriver ──► BLE client
//!                 (listener thread)                  (timer task)
//! ```
//!
//! - [`broadcaster`] - Periodic Heart Rate Measurement notifications
//! - [`lifecycle`] - Setup ordering and orderly shutdown

pub mod broadcaster;
pub mod lifecycle;

pub use broadcaster::{BroadcastDriver, TickOutcome, DEFAULT_BROADCAST_INTERVAL};
pub use lifecycle::{Bridge, BridgeConfig};
