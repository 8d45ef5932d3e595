//! BLE Heart Rate Service Protocol
//!
//! GATT layout of the standard Heart Rate Service and the wire format of the
//! Heart Rate Measurement characteristic.

use uuid::Uuid;

/// Heart Rate Service (0x180D)
pub const HEART_RATE_SERVICE_UUID: Uuid = uuid16(0x180D);

/// Heart Rate Measurement Characteristic (0x2A37)
pub const HEART_RATE_MEASUREMENT_UUID: Uuid = uuid16(0x2A37);

/// Name advertised by the peripheral
pub const DEFAULT_LOCAL_NAME: &str = "HRM-Bridge";

/// Measurement flags
pub mod flags {
    /// bit 0 clear: heart rate value is UINT8, no other fields present
    pub const UINT8_FORMAT: u8 = 0x00;
    /// bit 0 set: heart rate value is UINT16
    pub const UINT16_FORMAT: u8 = 0x01;
}

/// Expand a 16-bit SIG alias into the Bluetooth base UUID
/// (`0000XXXX-0000-1000-8000-00805F9B34FB`)
pub const fn uuid16(alias: u16) -> Uuid {
    Uuid::from_u128(((alias as u128) << 96) | 0x0000_0000_0000_1000_8000_00805f9b34fb)
}

/// Characteristic property bits as used in the GATT declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicProperties(pub u8);

impl CharacteristicProperties {
    pub const READ: Self = Self(0x02);
    pub const NOTIFY: Self = Self(0x10);

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub uuid: Uuid,
    pub properties: CharacteristicProperties,
    pub initial_value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattService {
    pub uuid: Uuid,
    pub characteristics: Vec<GattCharacteristic>,
}

impl GattService {
    pub fn characteristic(&self, uuid: Uuid) -> Option<&GattCharacteristic> {
        self.characteristics.iter().find(|c| c.uuid == uuid)
    }
}

/// Heart Rate Service with its single notify-only measurement characteristic
pub fn heart_rate_service() -> GattService {
    GattService {
        uuid: HEART_RATE_SERVICE_UUID,
        characteristics: vec![GattCharacteristic {
            uuid: HEART_RATE_MEASUREMENT_UUID,
            properties: CharacteristicProperties::NOTIFY,
            initial_value: vec![flags::UINT8_FORMAT],
        }],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub local_name: String,
    pub service_uuids: Vec<Uuid>,
}

impl Advertisement {
    pub fn heart_rate_monitor(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            service_uuids: vec![HEART_RATE_SERVICE_UUID],
        }
    }
}

impl Default for Advertisement {
    fn default() -> Self {
        Self::heart_rate_monitor(DEFAULT_LOCAL_NAME)
    }
}

/// Heart Rate Measurement value
///
/// ```text
/// [0] : Flags (0x00: UINT8 value, no energy expended, no RR intervals)
/// [1] : Heart rate (BPM)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BleMeasurementFrame([u8; 2]);

impl BleMeasurementFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bpm(&self) -> u8 {
        self.0[1]
    }
}

/// Encode a heart rate into a measurement frame
pub fn encode_measurement(bpm: u8) -> BleMeasurementFrame {
    BleMeasurementFrame([flags::UINT8_FORMAT, bpm])
}

/// Read the heart rate out of a measurement value, as a client would
///
/// Handles both value formats selected by flag bit 0. Trailing fields are
/// not interpreted.
pub fn parse_measurement(value: &[u8]) -> Option<u16> {
    let (&flag_byte, rest) = value.split_first()?;
    if flag_byte & flags::UINT16_FORMAT != 0 {
        match rest {
            [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
            _ => None,
        }
    } else {
        rest.first().map(|&bpm| bpm as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_uuids() {
        assert_eq!(
            HEART_RATE_SERVICE_UUID.to_string(),
            "0000180d-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            HEART_RATE_MEASUREMENT_UUID,
            Uuid::from_u128(0x00002a3700001000800000805f9b34fb)
        );
    }

    #[test]
    fn test_encode_measurement() {
        assert_eq!(encode_measurement(72).as_bytes(), &[0x00, 0x48]);
        assert_eq!(encode_measurement(85).as_bytes(), &[0x00, 0x55]);
        assert_eq!(encode_measurement(255).as_bytes(), &[0x00, 0xFF]);
    }

    #[test]
    fn test_encode_is_repeatable() {
        assert_eq!(encode_measurement(60), encode_measurement(60));
    }

    #[test]
    fn test_client_recovers_every_heart_rate() {
        for bpm in 1..=255u8 {
            let frame = encode_measurement(bpm);
            assert_eq!(parse_measurement(frame.as_bytes()), Some(bpm as u16));
        }
    }

    #[test]
    fn test_parse_uint16_and_truncated_values() {
        assert_eq!(parse_measurement(&[0x01, 0x2C, 0x01]), Some(300));
        assert_eq!(parse_measurement(&[0x01, 0x2C]), None);
        assert_eq!(parse_measurement(&[0x00]), None);
        assert_eq!(parse_measurement(&[]), None);
    }

    #[test]
    fn test_heart_rate_service_layout() {
        let service = heart_rate_service();
        assert_eq!(service.uuid, HEART_RATE_SERVICE_UUID);
        assert_eq!(service.characteristics.len(), 1);

        let measurement = service
            .characteristic(HEART_RATE_MEASUREMENT_UUID)
            .unwrap();
        assert!(measurement
            .properties
            .contains(CharacteristicProperties::NOTIFY));
        assert_eq!(measurement.initial_value, vec![0x00]);
    }

    #[test]
    fn test_default_advertisement() {
        let adv = Advertisement::default();
        assert_eq!(adv.local_name, "HRM-Bridge");
        assert_eq!(adv.service_uuids, vec![HEART_RATE_SERVICE_UUID]);
    }
}
