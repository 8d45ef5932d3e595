//! ANT+ Heart Rate Monitor Protocol
//!
//! Channel parameters and broadcast payload decoding for the ANT+ HRM
//! device profile.

use crate::domain::models::HeartRateReading;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// ANT+ device type of the Heart Rate Monitor class
pub const HRM_DEVICE_TYPE: u8 = 120;

/// Transmission type 0 pairs with any transmission type
pub const WILDCARD_TRANSMISSION_TYPE: u8 = 0;

/// Device number 0 pairs with the first sensor found
pub const WILDCARD_DEVICE_NUMBER: u16 = 0;

/// Channel used for the HRM sensor
pub const HRM_CHANNEL: u8 = 0;

/// Network slot holding the ANT+ key
pub const ANT_PLUS_NETWORK: u8 = 0;

/// Minimum payload length of an HRM broadcast
pub const MIN_BROADCAST_LEN: usize = 5;

/// Public ANT+ network key
pub const ANT_PLUS_NETWORK_KEY: NetworkKey =
    NetworkKey([0xB9, 0xA5, 0x21, 0xFB, 0xBD, 0x72, 0xC3, 0x45]);

/// Decode an HRM broadcast payload
///
/// # Payload Layout
///
/// ```text
/// [0]   : Heart beat count (cumulative)
/// [1]   : Computed heart rate (BPM)
/// [2-4] : Page specific data
/// ```
///
/// Frames shorter than [`MIN_BROADCAST_LEN`] and frames carrying a zero
/// heart rate produce no reading.
pub fn decode_broadcast(data: &[u8]) -> Option<HeartRateReading> {
    if data.len() < MIN_BROADCAST_LEN {
        return None;
    }

    HeartRateReading::new(data[1])
}

/// 8-byte ANT network key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NetworkKey(pub [u8; 8]);

impl NetworkKey {
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl Default for NetworkKey {
    fn default() -> Self {
        ANT_PLUS_NETWORK_KEY
    }
}

// Keys are not printed in full
impl fmt::Debug for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkKey({:02X}..)", self.0[0])
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NetworkKeyError {
    #[error("network key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("network key must be 8 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for NetworkKey {
    type Err = NetworkKeyError;

    /// Parse 16 hex digits, optionally separated by spaces, colons or dashes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | ':' | '-'))
            .collect();
        let bytes = hex::decode(digits)?;
        let key: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| NetworkKeyError::InvalidLength(bytes.len()))?;
        Ok(Self(key))
    }
}

impl Serialize for NetworkKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NetworkKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Channel ID used to pair with one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelId {
    pub device_number: u16,
    pub device_type: u8,
    pub transmission_type: u8,
}

impl ChannelId {
    /// Channel ID for an HRM sensor with the given device number
    pub fn heart_rate_monitor(device_number: u16) -> Self {
        Self {
            device_number,
            device_type: HRM_DEVICE_TYPE,
            transmission_type: WILDCARD_TRANSMISSION_TYPE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    /// Slave channel that only receives
    SlaveReceiveOnly,
}

/// Capabilities reported by the ANT USB stick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub max_channels: u8,
    pub max_networks: u8,
}
