pub mod ant;
pub mod ble;
pub mod logging;
