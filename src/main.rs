use ant_hrm_ble_bridge::bridge::{Bridge, BridgeConfig};
use ant_hrm_ble_bridge::domain::settings::{Settings, SettingsService};
use ant_hrm_ble_bridge::infrastructure::ant::protocol::NetworkKey;
use ant_hrm_ble_bridge::infrastructure::ant::{ReceiverConfig, SimulatedSensor};
use ant_hrm_ble_bridge::infrastructure::ble::protocol::Advertisement;
use ant_hrm_ble_bridge::infrastructure::ble::LogPeripheral;
use ant_hrm_ble_bridge::infrastructure::logging;
use anyhow::Context;
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Re-broadcast an ANT+ heart rate monitor as a BLE Heart Rate Service
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file (default: <config dir>/AntHrmBleBridge/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// ANT+ device number of the heart rate monitor (0 pairs with any)
    #[arg(long)]
    device_id: Option<u16>,

    /// ANT+ network key as 16 hex digits
    #[arg(long)]
    network_key: Option<NetworkKey>,

    /// Milliseconds between BLE notifications
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Advertised BLE local name
    #[arg(long)]
    name: Option<String>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(device_id) = self.device_id {
            settings.ant_device_id = device_id;
        }
        if let Some(key) = self.network_key {
            settings.ant_network_key = key;
        }
        if let Some(interval_ms) = self.interval_ms {
            settings.broadcast_interval_ms = interval_ms;
        }
        if let Some(name) = &self.name {
            settings.advertised_name = name.clone();
        }
    }
}

fn bridge_config(settings: &Settings) -> BridgeConfig {
    BridgeConfig {
        receiver: ReceiverConfig {
            device_number: settings.ant_device_id,
            network_key: settings.ant_network_key,
        },
        advertisement: Advertisement::heart_rate_monitor(settings.advertised_name.clone()),
        broadcast_interval: settings.broadcast_interval(),
    }
}

/// Cancel the bridge once `interrupt` resolves
///
/// If the signal handler cannot be installed the bridge keeps running.
async fn cancel_on_interrupt<F>(interrupt: F, cancel: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            info!("Interrupt received");
            cancel.cancel();
        }
        Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings_service = match &cli.config {
        Some(path) => SettingsService::from_path(path.clone())?,
        None => SettingsService::new()?,
    };
    cli.apply(settings_service.get_mut());
    settings_service.get().validate()?;

    let _logging_guard = logging::init_logger(&settings_service.get().log_settings)
        .context("Failed to initialize logging")?;

    info!("Starting ANT+ HRM to BLE bridge");

    if cli.save {
        settings_service.save()?;
        info!("Settings saved to {}", settings_service.path().display());
    }

    let settings = settings_service.get();
    let ant = SimulatedSensor::new(settings.simulated_warmup_frames);
    let mut bridge = Bridge::new(bridge_config(settings), ant, LogPeripheral::new());

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(tokio::signal::ctrl_c(), cancel.clone()));

    bridge.run(&cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "ant-hrm-ble-bridge",
            "--device-id",
            "22184",
            "--network-key",
            "0102030405060708",
            "--interval-ms",
            "500",
            "--name",
            "Chest Strap",
        ]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);

        assert_eq!(settings.ant_device_id, 22184);
        assert_eq!(settings.ant_network_key, NetworkKey([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(settings.broadcast_interval_ms, 500);

        let config = bridge_config(&settings);
        assert_eq!(config.receiver.device_number, 22184);
        assert_eq!(config.advertisement.local_name, "Chest Strap");
    }

    #[test]
    fn test_cli_rejects_short_network_key() {
        let result = Cli::try_parse_from(["ant-hrm-ble-bridge", "--network-key", "B9A5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_without_flags_keeps_settings() {
        let cli = Cli::parse_from(["ant-hrm-ble-bridge"]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.ant_device_id, 0);
        assert_eq!(settings.broadcast_interval_ms, 1000);
    }

    #[tokio::test]
    async fn test_interrupt_cancels_bridge() {
        let cancel = CancellationToken::new();
        cancel_on_interrupt(async { Ok(()) }, cancel.clone()).await;
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_signal_error_does_not_cancel_bridge() {
        let cancel = CancellationToken::new();
        let failed = async { Err(std::io::Error::other("no signal handler")) };
        cancel_on_interrupt(failed, cancel.clone()).await;
        assert!(!cancel.is_cancelled());
    }
}
