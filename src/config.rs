//! Bridge configuration
//!
//! Values come from an optional YAML file and are then overridden by the
//! environment (`DEDALUS_API_KEY`, `DEDALUS_API_BASE`, `VAPI_BRIDGE_PORT`).

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use anyhow::{anyhow, Result};
use dedalus_client::{DedalusConfig, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const API_KEY_ENV: &str = "DEDALUS_API_KEY";
pub const API_BASE_ENV: &str = "DEDALUS_API_BASE";
pub const PORT_ENV: &str = "VAPI_BRIDGE_PORT";

const DEFAULT_PORT: u16 = 8787;
const DEFAULT_CONTEXT_ZONE: &str = "America/Los_Angeles";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// IANA zone used for the date sentence prepended to time-sensitive requests.
    pub date_context_zone: String,
    pub dedalus: DedalusSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedalusSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    /// Unset (or 0) leaves the runner call unbounded.
    pub timeout_secs: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            date_context_zone: DEFAULT_CONTEXT_ZONE.to_string(),
            dedalus: DedalusSettings::default(),
        }
    }
}

impl Default for DedalusSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl BridgeConfig {
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| env::var(key).ok());
    }

    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).and_then(non_empty) {
            self.dedalus.api_key = Some(key);
        }
        if let Some(base) = lookup(API_BASE_ENV).and_then(non_empty) {
            self.dedalus.api_base = base;
        }
        if let Some(raw) = lookup(PORT_ENV) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(?err, value = raw, "invalid {PORT_ENV} value"),
            }
        }
    }

    pub fn dedalus_config(&self) -> Result<DedalusConfig> {
        let api_key = self
            .dedalus
            .api_key
            .clone()
            .and_then(non_empty)
            .ok_or_else(|| anyhow!("Dedalus API key missing; set {API_KEY_ENV} or dedalus.api_key"))?;
        Ok(DedalusConfig {
            api_key,
            api_base: self.dedalus.api_base.clone(),
            timeout: self
                .dedalus
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: BridgeConfig = serde_yaml::from_str("port: 9000\ndedalus:\n  timeout_secs: 30\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.date_context_zone, "America/Los_Angeles");
        assert_eq!(config.dedalus.api_base, DEFAULT_API_BASE);
        assert_eq!(config.dedalus.timeout_secs, Some(30));
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            (API_KEY_ENV, " secret "),
            (API_BASE_ENV, "http://localhost:9999"),
            (PORT_ENV, "3000"),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        config.apply_overrides_with(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.port, 3000);
        assert_eq!(config.dedalus.api_base, "http://localhost:9999");
        let dedalus = config.dedalus_config().unwrap();
        assert_eq!(dedalus.api_key, "secret");
        assert!(dedalus.timeout.is_none());
    }

    #[test]
    fn bad_port_override_is_ignored() {
        let mut config = BridgeConfig::default();
        config.apply_overrides_with(|key| (key == PORT_ENV).then(|| "not-a-port".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let config = BridgeConfig::default();
        let err = config.dedalus_config().unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }
}
