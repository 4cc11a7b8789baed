//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables

use crate::error::{Error, Result};
use netkit_core::NetworkParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Client parameters (base URL, timeouts, cache)
    pub network: NetworkParams,

    /// Parameters injected into every request
    pub common: CommonConfig,

    /// URL prefixes that must never reach the network
    pub blocked_urls: Vec<String>,

    /// Body returned for blocked requests instead of the default envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_template: Option<Value>,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Common parameters and the URLs they apply to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    /// Only URLs starting with this prefix receive common parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,

    pub headers: BTreeMap<String, String>,

    pub query: BTreeMap<String, String>,

    /// Merged into JSON and form bodies; caller fields win
    pub body: BTreeMap<String, Value>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,

    /// Include thread IDs
    pub thread_ids: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
            thread_ids: false,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;

        let invalid = |expected: &str| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: expected.to_string(),
        };

        if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| {
                tracing::debug!(error = %e, "YAML config rejected");
                invalid("YAML")
            })
        } else {
            serde_json::from_str(&content).map_err(|e| {
                tracing::debug!(error = %e, "JSON config rejected");
                invalid("JSON")
            })
        }
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in &Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations, then
    /// apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.network.merge_with_env()?;
        Ok(config)
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".netkit.yaml"),
            PathBuf::from(".netkit.json"),
            PathBuf::from("netkit.yaml"),
            PathBuf::from("netkit.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let netkit_dir = config_dir.join("netkit");
            paths.push(netkit_dir.join("config.yaml"));
            paths.push(netkit_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".netkit.yaml"));
            paths.push(home_dir.join(".netkit.json"));
        }

        paths
    }

    /// Check everything a client build would reject, plus the block list
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        for prefix in &self.blocked_urls {
            if prefix.trim().is_empty() {
                return Err(Error::config("blocked_urls contains an empty prefix"));
            }
        }
        if let Some(template) = &self.block_template {
            if !template.is_object() {
                return Err(Error::config("block_template must be a JSON object"));
            }
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
