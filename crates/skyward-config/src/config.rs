//! Configuration structs with protocol defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skyward_protocol::{
    CONNECT_ATTEMPTS, CONNECT_TIMEOUT_MS, DEFAULT_TCP_PORT, MIN_BROADCAST_INTERVAL_MS,
    RESERVED_DATAGRAM_PORT,
};
use tracing::info;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Session/network settings.
    pub network: NetworkConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Session/network configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the host binds its listener to.
    pub bind_address: String,
    /// Host address a joining client dials.
    pub server_address: String,
    /// TCP port for the session stream.
    pub tcp_port: u16,
    /// Reserved for a future unreliable channel; nothing binds it yet.
    pub datagram_port: u16,
    /// Minimum milliseconds between periodic position broadcasts.
    pub broadcast_interval_ms: u64,
    /// Per-attempt connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Connection attempts before a join gives up.
    pub connect_attempts: u32,
    /// Maximum simultaneous participants (host only).
    pub max_peers: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            server_address: "127.0.0.1".to_string(),
            tcp_port: DEFAULT_TCP_PORT,
            datagram_port: RESERVED_DATAGRAM_PORT,
            broadcast_interval_ms: MIN_BROADCAST_INTERVAL_MS,
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            connect_attempts: CONNECT_ATTEMPTS,
            max_peers: 8,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            info!("loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            info!("created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_carries_protocol_constants() {
        let config = Config::default();
        assert_eq!(config.network.tcp_port, 2307);
        assert_eq!(config.network.datagram_port, 2309);
        assert_eq!(config.network.broadcast_interval_ms, 10);
        assert_eq!(config.network.connect_timeout_ms, 1000);
        assert_eq!(config.network.connect_attempts, 10);
    }

    #[test]
    fn config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn missing_section_uses_default() {
        let ron_str = "(network: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.network.server_address = "10.0.0.1".to_string();
        config.network.tcp_port = 4100;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
