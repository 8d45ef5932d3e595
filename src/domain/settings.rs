use crate::bridge::DEFAULT_BROADCAST_INTERVAL;
use crate::infrastructure::ant::protocol::{NetworkKey, WILDCARD_DEVICE_NUMBER};
use crate::infrastructure::ble::protocol::DEFAULT_LOCAL_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("broadcast interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "ant_hrm_ble_bridge".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ANT+ Settings
    #[serde(default = "default_device_id")]
    pub ant_device_id: u16,
    #[serde(default)]
    pub ant_network_key: NetworkKey,
    #[serde(default = "default_warmup_frames")]
    pub simulated_warmup_frames: u32,

    // BLE Settings
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,
    #[serde(default = "default_advertised_name")]
    pub advertised_name: String,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ant_device_id: default_device_id(),
            ant_network_key: NetworkKey::default(),
            simulated_warmup_frames: default_warmup_frames(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
            advertised_name: default_advertised_name(),
            log_settings: LogSettings::default(),
        }
    }
}

impl Settings {
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.broadcast_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval);
        }
        Ok(())
    }
}

fn default_device_id() -> u16 {
    WILDCARD_DEVICE_NUMBER
}
fn default_warmup_frames() -> u32 {
    4
}
fn default_broadcast_interval_ms() -> u64 {
    DEFAULT_BROADCAST_INTERVAL.as_millis() as u64
}
fn default_advertised_name() -> String {
    DEFAULT_LOCAL_NAME.to_string()
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    /// Load from the per-user config directory
    pub fn new() -> Result<Self, SettingsError> {
        let settings_path = Self::get_settings_path()?;
        Self::from_path(settings_path)
    }

    /// Load from an explicit file
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read or parsed is an error, so `save` never overwrites it with defaults.
    pub fn from_path(settings_path: PathBuf) -> Result<Self, SettingsError> {
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Settings::default()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> Result<PathBuf, SettingsError> {
        let mut path = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        path.push("AntHrmBleBridge");
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> Result<Settings, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
