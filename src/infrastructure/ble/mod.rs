//! BLE Module
//!
//! Exposes the heart rate through the standard BLE Heart Rate Service.
//!
//! ## Modules
//!
//! - [`protocol`] - Service/characteristic UUIDs and measurement encoding
//! - [`peripheral`] - Backend abstraction for the GATT server
//! - [`log_peripheral`] - Backend that reports notifications through tracing

pub mod log_peripheral;
pub mod peripheral;
pub mod protocol;

pub use log_peripheral::LogPeripheral;
pub use peripheral::{BleError, BlePeripheral};
