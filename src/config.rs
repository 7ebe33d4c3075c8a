//! Client configuration.

use crate::error::{ClientError, ClientErrorKind};
use crate::transport::MqttSettings;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Which collaborator answers for the automated O player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeciderKind {
    /// Run the external bot script.
    Script,
    /// Pick a random empty cell in-process.
    Random,
}

/// Configuration for the terminal client.
///
/// Every field has a default, so an empty or missing file is valid.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Broker host name or address.
    broker_host: String,

    /// Broker port.
    broker_port: u16,

    /// MQTT client identifier.
    client_id: String,

    /// Keep-alive interval in seconds.
    keep_alive_secs: u64,

    /// How long to wait for the broker to accept the connection.
    connect_timeout_ms: u64,

    /// Upper bound on a single wait for the next board update.
    receive_timeout_ms: u64,

    /// How long a publish waits for its acknowledgement.
    publish_timeout_ms: u64,

    /// Bot-vs-bot poll interval.
    poll_interval_ms: u64,

    /// Pause after a bot move so the device can echo the new board.
    settle_delay_ms: u64,

    /// Move decider for the automated O player.
    decider: DeciderKind,

    /// Program run by the script decider.
    decider_command: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            broker_host: "34.83.53.31".to_string(),
            broker_port: 1883,
            client_id: "C_TUI_Client".to_string(),
            keep_alive_secs: 20,
            connect_timeout_ms: 10_000,
            receive_timeout_ms: 10_000,
            publish_timeout_ms: 1_000,
            poll_interval_ms: 100,
            settle_delay_ms: 1_000,
            decider: DeciderKind::Script,
            decider_command: "./bot_player.sh".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::new(ClientErrorKind::Config(format!(
                "Failed to read config file: {}",
                e
            )))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ClientError::new(ClientErrorKind::Config(format!(
                "Failed to parse config: {}",
                e
            )))
        })?;

        info!(broker = %config.broker_host, port = config.broker_port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Broker settings for the MQTT transport.
    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings::new(
            self.broker_host.clone(),
            self.broker_port,
            self.client_id.clone(),
            Duration::from_secs(self.keep_alive_secs),
            Duration::from_millis(self.connect_timeout_ms),
            Duration::from_millis(self.publish_timeout_ms),
        )
    }

    /// Coordinator timing.
    pub fn timing(&self) -> Timing {
        Timing {
            receive_timeout: Duration::from_millis(self.receive_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }
}

/// Waits used by the turn coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Upper bound on a single blocking receive.
    pub receive_timeout: Duration,
    /// Bot-vs-bot poll interval.
    pub poll_interval: Duration,
    /// Pause after each bot move.
    pub settle_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        ClientConfig::default().timing()
    }
}
