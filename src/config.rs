//! Configuration management for intcode-emu.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (`INTCODE_NETWORK_SIZE`, `INTCODE_POLL_BACKOFF_MICROS`, etc.)
//! 2. Project-local config file (`./intcode-emu.toml`)
//! 3. User config file (`~/.config/intcode-emu/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # intcode-emu.toml
//!
//! [network]
//! size = 50
//! monitor_address = 255
//! repeat_match = "y"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use crate::network::{NetworkConfig, RepeatMatch};

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// intcode-emu configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Network composition settings.
    pub network: NetworkSettings,
}

/// `[network]` table. Unset fields fall back to [`NetworkConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkSettings {
    /// Number of unit addresses.
    pub size: Option<usize>,
    /// Destination captured by the NAT.
    pub monitor_address: Option<i64>,
    /// Consecutive empty polls before a mailbox counts as idle.
    pub idle_threshold: Option<u64>,
    /// Sleep after an empty poll, in microseconds.
    pub poll_backoff_micros: Option<u64>,
    /// Pause between idle scans, in milliseconds.
    pub monitor_interval_millis: Option<u64>,
    /// Upper bound on a network run, in seconds.
    pub timeout_secs: Option<u64>,
    /// `"y"` or `"packet"`.
    pub repeat_match: Option<RepeatMatch>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `intcode-emu.toml`
    /// 3. User config `~/.config/intcode-emu/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Resolve a concrete network configuration.
    pub fn network_config(&self) -> NetworkConfig {
        let defaults = NetworkConfig::default();
        let net = &self.network;
        NetworkConfig {
            size: net.size.unwrap_or(defaults.size),
            monitor_address: net.monitor_address.unwrap_or(defaults.monitor_address),
            idle_threshold: net.idle_threshold.unwrap_or(defaults.idle_threshold),
            poll_backoff: net
                .poll_backoff_micros
                .map_or(defaults.poll_backoff, Duration::from_micros),
            monitor_interval: net
                .monitor_interval_millis
                .map_or(defaults.monitor_interval, Duration::from_millis),
            timeout: net.timeout_secs.map_or(defaults.timeout, Duration::from_secs),
            repeat_match: net.repeat_match.unwrap_or(defaults.repeat_match),
        }
    }

    /// Load user configuration from ~/.config/intcode-emu/config.toml
    fn load_user_config() -> Option<Self> {
        Self::load_from_file(&Self::user_config_path()?)
    }

    /// Load project-local configuration from ./intcode-emu.toml
    fn load_local_config() -> Option<Self> {
        Self::load_from_file(Path::new("intcode-emu.toml"))
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        let (net, over) = (&mut self.network, other.network);
        if over.size.is_some() {
            net.size = over.size;
        }
        if over.monitor_address.is_some() {
            net.monitor_address = over.monitor_address;
        }
        if over.idle_threshold.is_some() {
            net.idle_threshold = over.idle_threshold;
        }
        if over.poll_backoff_micros.is_some() {
            net.poll_backoff_micros = over.poll_backoff_micros;
        }
        if over.monitor_interval_millis.is_some() {
            net.monitor_interval_millis = over.monitor_interval_millis;
        }
        if over.timeout_secs.is_some() {
            net.timeout_secs = over.timeout_secs;
        }
        if over.repeat_match.is_some() {
            net.repeat_match = over.repeat_match;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let net = &mut self.network;
        override_from(&lookup, "INTCODE_NETWORK_SIZE", &mut net.size);
        override_from(&lookup, "INTCODE_MONITOR_ADDRESS", &mut net.monitor_address);
        override_from(&lookup, "INTCODE_IDLE_THRESHOLD", &mut net.idle_threshold);
        override_from(&lookup, "INTCODE_POLL_BACKOFF_MICROS", &mut net.poll_backoff_micros);
        override_from(&lookup, "INTCODE_MONITOR_INTERVAL_MILLIS", &mut net.monitor_interval_millis);
        override_from(&lookup, "INTCODE_REPEAT_MATCH", &mut net.repeat_match);
        override_from(&lookup, "INTCODE_NETWORK_TIMEOUT_SECS", &mut net.timeout_secs);
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("intcode-emu").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# intcode-emu configuration
# Place this file at ~/.config/intcode-emu/config.toml or ./intcode-emu.toml

[network]
# Number of unit addresses (0..size)
size = 50

# Packets sent here are captured by the NAT
monitor_address = 255

# Empty polls in a row before a unit counts as idle
idle_threshold = 2

# Sleep after an empty poll, and between idle scans
poll_backoff_micros = 50
monitor_interval_millis = 1

# Give up after this long
timeout_secs = 30

# When two NAT deliveries count as a repeat: "y" or "packet"
repeat_match = "y"
"#
        .to_string()
    }
}

/// Replace `slot` with the parsed value of `key`, if set and valid.
fn override_from<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut Option<T>)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else { return };
    match raw.trim().parse() {
        Ok(value) => {
            log::info!("Using {} from environment: {}", key, raw);
            *slot = Some(value);
        }
        Err(e) => log::warn!("Ignoring {}={:?}: {}", key, raw, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_network_config() {
        assert_eq!(Config::default().network_config(), NetworkConfig::default());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config {
            network: NetworkSettings {
                size: Some(10),
                repeat_match: Some(RepeatMatch::Packet),
                ..NetworkSettings::default()
            },
        };

        let overlay = Config {
            network: NetworkSettings {
                size: None,
                timeout_secs: Some(5),
                repeat_match: Some(RepeatMatch::Y),
                ..NetworkSettings::default()
            },
        };

        base.merge(overlay);

        assert_eq!(base.network.size, Some(10));
        assert_eq!(base.network.timeout_secs, Some(5));
        assert_eq!(base.network.repeat_match, Some(RepeatMatch::Y));

        let resolved = base.network_config();
        assert_eq!(resolved.size, 10);
        assert_eq!(resolved.timeout, Duration::from_secs(5));
        assert_eq!(resolved.monitor_address, 255);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("INTCODE_NETWORK_SIZE", "8"),
            ("INTCODE_REPEAT_MATCH", "packet"),
            ("INTCODE_IDLE_THRESHOLD", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.network.size, Some(8));
        assert_eq!(config.network.repeat_match, Some(RepeatMatch::Packet));
        assert_eq!(config.network.idle_threshold, None);
    }

    #[test]
    fn test_env_overrides_timing() {
        let env: HashMap<&str, &str> = [
            ("INTCODE_POLL_BACKOFF_MICROS", "200"),
            ("INTCODE_MONITOR_INTERVAL_MILLIS", " 4 "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        let resolved = config.network_config();
        assert_eq!(resolved.poll_backoff, Duration::from_micros(200));
        assert_eq!(resolved.monitor_interval, Duration::from_millis(4));
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = Config::sample_config();
        let config: Config = toml::from_str(&sample).expect("Sample config should parse");
        assert_eq!(config.network_config(), NetworkConfig::default());
    }

    #[test]
    fn test_global_config_cached() {
        assert!(std::ptr::eq(Config::get(), Config::get()));
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str("[network]\nsize = 3\n").unwrap();
        assert_eq!(config.network.size, Some(3));
        assert_eq!(config.network.monitor_address, None);

        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty, Config::default());
    }
}
