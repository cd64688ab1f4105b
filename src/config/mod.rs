//! Configuration management for gateway-sync
//!
//! Settings are read from a TOML file, then overridden by environment
//! variables, then by command-line flags.

use crate::error::{Result, SyncError};
use crate::registration::{default_node_meta, RegistrationPolicy, DEFAULT_PORT};
use crate::templating::TagMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Prefix for environment overrides, e.g. `GATEWAY_SYNC_AWS__REGION`
const ENV_PREFIX: &str = "GATEWAY_SYNC_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub aws: AwsConfig,
    pub consul: ConsulConfig,
    pub sync: SyncConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region searched for API gateways
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsulConfig {
    /// Base URL of the Consul HTTP API
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
}

/// Polling, filtering and tag templating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause between cycles, e.g. "90s", "5m"
    pub interval: String,
    /// Inclusion filters, all of which must match
    #[serde(default)]
    pub filters: Vec<String>,
    /// Exclusion filters, any of which removes a service
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Tag templates rendered per service
    #[serde(default)]
    pub tags: Vec<String>,
    /// Drop tags that render empty instead of keeping them in position
    #[serde(default = "default_compact_tags")]
    pub compact_tags: bool,
}

fn default_compact_tags() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub port: u16,
    #[serde(default = "default_node_meta")]
    pub node_meta: HashMap<String, String>,
    #[serde(default)]
    pub service_meta: HashMap<String, String>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            node_meta: default_node_meta(),
            service_meta: HashMap::new(),
        }
    }
}

impl RegistrationConfig {
    pub fn policy(&self) -> RegistrationPolicy {
        RegistrationPolicy {
            port: self.port,
            node_meta: self.node_meta.clone(),
            service_meta: self.service_meta.clone(),
        }
    }
}

impl SyncConfig {
    /// Polling interval; `None` when the string does not parse
    pub fn interval(&self) -> Option<Duration> {
        parse_interval(&self.interval)
    }

    pub fn tag_mode(&self) -> TagMode {
        if self.compact_tags {
            TagMode::Compact
        } else {
            TagMode::Strict
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SyncError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| SyncError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: GATEWAY_SYNC_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        if let Ok(address) = std::env::var("CONSUL_HTTP_ADDR") {
            self.consul.address = normalize_consul_address(&address);
        }

        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "AWS__REGION" => {
                self.aws.region = value.to_string();
            }
            "CONSUL__ADDRESS" => {
                self.consul.address = normalize_consul_address(value);
            }
            "CONSUL__DATACENTER" => {
                self.consul.datacenter = Some(value.to_string());
            }
            "SYNC__INTERVAL" => {
                self.sync.interval = value.to_string();
            }
            "SYNC__COMPACT_TAGS" => {
                self.sync.compact_tags =
                    value.parse().map_err(|_| SyncError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as boolean", value),
                    })?;
            }
            "REGISTRATION__PORT" => {
                self.registration.port =
                    value.parse().map_err(|_| SyncError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as port", value),
                    })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("gateway-sync").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            aws: AwsConfig {
                region: "us-west-2".to_string(),
            },
            consul: ConsulConfig {
                address: "http://127.0.0.1:8500".to_string(),
                datacenter: None,
            },
            sync: SyncConfig {
                interval: "90s".to_string(),
                filters: Vec::new(),
                exclusions: Vec::new(),
                tags: Vec::new(),
                compact_tags: true,
            },
            registration: RegistrationConfig::default(),
        }
    }
}

/// `CONSUL_HTTP_ADDR` may omit the scheme
fn normalize_consul_address(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Parse an interval string ("90", "90s", "500ms", "5m", "1h")
pub fn parse_interval(interval: &str) -> Option<Duration> {
    let interval = interval.trim();

    // Check "ms" before "s" because "ms" ends with "s"
    if let Some(ms) = interval.strip_suffix("ms") {
        ms.parse().ok().map(Duration::from_millis)
    } else if let Some(secs) = interval.strip_suffix('s') {
        secs.parse().ok().map(Duration::from_secs)
    } else if let Some(mins) = interval.strip_suffix('m') {
        mins
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else if let Some(hours) = interval.strip_suffix('h') {
        hours
            .parse::<u64>()
            .ok()
            .and_then(|h| h.checked_mul(3600))
            .map(Duration::from_secs)
    } else {
        interval.parse().ok().map(Duration::from_secs)
    }
}
