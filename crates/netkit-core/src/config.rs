//! Client parameters
//!
//! Loaded from YAML or JSON, then overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::http::CachePolicy;
use crate::{Error, Result};

/// Transport cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_size_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Parameters the client is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Base URL relative paths are joined to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub cache: CacheConfig,
    /// `max-age` sent with online requests
    pub fresh_max_age_secs: u64,
    /// `max-stale` sent with offline cache requests
    pub max_stale_secs: u64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout_secs: 15,
            read_timeout_secs: 15,
            write_timeout_secs: 15,
            cache: CacheConfig::default(),
            fresh_max_age_secs: 5,
            max_stale_secs: 60 * 60 * 24 * 7,
        }
    }
}

impl NetworkParams {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Load parameters from a YAML or JSON file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let params = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        Ok(params)
    }

    /// Apply `NETKIT_BASE_URL`, `NETKIT_CONNECT_TIMEOUT` and
    /// `NETKIT_READ_TIMEOUT`
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn merge_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("NETKIT_BASE_URL") {
            self.base_url = Some(base_url);
        }
        if let Some(value) = lookup("NETKIT_CONNECT_TIMEOUT") {
            self.connect_timeout_secs = parse_secs("NETKIT_CONNECT_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("NETKIT_READ_TIMEOUT") {
            self.read_timeout_secs = parse_secs("NETKIT_READ_TIMEOUT", &value)?;
        }
        Ok(())
    }

    /// Reject parameters the transport cannot be built from
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(Error::configuration("connect_timeout_secs must be positive"));
        }
        if self.read_timeout_secs == 0 && self.write_timeout_secs == 0 {
            return Err(Error::configuration(
                "read_timeout_secs and write_timeout_secs cannot both be zero",
            ));
        }
        self.parsed_base_url()?;
        Ok(())
    }

    /// The base URL, parsed
    pub fn parsed_base_url(&self) -> Result<Option<Url>> {
        match self.base_url.as_deref() {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => Url::parse(raw)
                .map(Some)
                .map_err(|e| Error::invalid_url(raw, e)),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Whole-call budget: read plus write
    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs + self.write_timeout_secs)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            fresh_max_age: Duration::from_secs(self.fresh_max_age_secs),
            max_stale: Duration::from_secs(self.max_stale_secs),
        }
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|e| Error::Configuration {
        message: format!("{} must be a number of seconds, got '{}'", key, value),
        source: Some(anyhow::Error::new(e)),
    })
}
