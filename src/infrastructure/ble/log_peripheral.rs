//! Log-only BLE peripheral
//!
//! Keeps the GATT table in memory and reports every advertisement and
//! notification through tracing. Used when the bridge runs without a
//! Bluetooth adapter.

use crate::infrastructure::ble::peripheral::{BleError, BlePeripheral};
use crate::infrastructure::ble::protocol::{
    Advertisement, CharacteristicProperties, GattService,
};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CharacteristicSlot {
    properties: CharacteristicProperties,
    value: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct LogPeripheral {
    characteristics: HashMap<Uuid, CharacteristicSlot>,
    advertising: Option<Advertisement>,
}

impl LogPeripheral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising.is_some()
    }

    /// Current value of a registered characteristic
    pub fn value(&self, characteristic: Uuid) -> Option<&[u8]> {
        self.characteristics
            .get(&characteristic)
            .map(|slot| slot.value.as_slice())
    }
}

impl BlePeripheral for LogPeripheral {
    async fn register_service(&mut self, service: &GattService) -> Result<(), BleError> {
        if service.characteristics.is_empty() {
            return Err(BleError::RegistrationFailed(
                service.uuid,
                "service has no characteristics".into(),
            ));
        }

        for characteristic in &service.characteristics {
            self.characteristics.insert(
                characteristic.uuid,
                CharacteristicSlot {
                    properties: characteristic.properties,
                    value: characteristic.initial_value.clone(),
                },
            );
        }

        info!(
            "Registered GATT service {} with {} characteristic(s)",
            service.uuid,
            service.characteristics.len()
        );
        Ok(())
    }

    async fn start_advertising(&mut self, advertisement: &Advertisement) -> Result<(), BleError> {
        if self.characteristics.is_empty() {
            return Err(BleError::AdvertisingFailed(
                "no services registered".into(),
            ));
        }

        info!(
            name = %advertisement.local_name,
            services = ?advertisement.service_uuids,
            "Advertising as Heart Rate Monitor"
        );
        self.advertising = Some(advertisement.clone());
        Ok(())
    }

    async fn notify(&mut self, characteristic: Uuid, value: &[u8]) -> Result<(), BleError> {
        let slot = self
            .characteristics
            .get_mut(&characteristic)
            .ok_or(BleError::UnknownCharacteristic(characteristic))?;

        if !slot.properties.contains(CharacteristicProperties::NOTIFY) {
            return Err(BleError::NotifyNotSupported(characteristic));
        }

        slot.value.clear();
        slot.value.extend_from_slice(value);
        debug!(%characteristic, value = ?value, "Notify");
        Ok(())
    }
}
