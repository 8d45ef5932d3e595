//! ANT+ Module
//!
//! Receives the heart rate from an ANT+ HRM sensor.
//!
//! ## Modules
//!
//! - [`protocol`] - HRM channel parameters and broadcast decoding
//! - [`transport`] - Transport abstraction the USB driver implements
//! - [`receiver`] - Channel setup and frame-to-state handling
//! - [`simulated`] - Sensor simulation for running without a USB stick

pub mod protocol;
pub mod receiver;
pub mod simulated;
pub mod transport;

pub use receiver::{AntReceiver, ReceiverConfig};
pub use simulated::SimulatedSensor;
pub use transport::{AntError, AntTransport, FrameHandler};
