//! BLE Peripheral Abstraction
//!
//! Every BLE backend implements [`BlePeripheral`], so the broadcaster is
//! written once regardless of which peripheral stack drives the adapter.

use crate::infrastructure::ble::protocol::{Advertisement, GattService};
use std::future::Future;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a BLE peripheral backend
#[derive(Debug, Error)]
pub enum BleError {
    #[error("no Bluetooth adapter available")]
    AdapterNotFound,
    #[error("service {0} registration failed: {1}")]
    RegistrationFailed(Uuid, String),
    #[error("characteristic {0} is not registered")]
    UnknownCharacteristic(Uuid),
    #[error("characteristic {0} does not support notifications")]
    NotifyNotSupported(Uuid),
    #[error("advertising failed: {0}")]
    AdvertisingFailed(String),
    #[error("characteristic update failed: {0}")]
    UpdateFailed(String),
}

/// GATT server side of a BLE adapter
pub trait BlePeripheral {
    /// Publish a service and its characteristics
    fn register_service(
        &mut self,
        service: &GattService,
    ) -> impl Future<Output = Result<(), BleError>> + Send;

    fn start_advertising(
        &mut self,
        advertisement: &Advertisement,
    ) -> impl Future<Output = Result<(), BleError>> + Send;

    /// Set a characteristic value and notify subscribed clients
    fn notify(
        &mut self,
        characteristic: Uuid,
        value: &[u8],
    ) -> impl Future<Output = Result<(), BleError>> + Send;
}
