//! ANT+ heart rate monitor to Bluetooth LE bridge
//!
//! Receives the heart rate from an ANT+ HRM sensor and re-publishes it
//! through the standard BLE Heart Rate Service.

pub mod bridge;
pub mod domain;
pub mod infrastructure;
