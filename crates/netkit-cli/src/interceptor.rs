//! Interceptor driven by the configuration file
//!
//! Supplies the configured common parameters, refuses requests to blocked
//! URL prefixes and reports connectivity from the `--offline` flag. Hooks
//! log through `tracing` with sensitive values redacted.

use crate::config::{CommonConfig, Config};
use crate::logging::redaction;
use netkit_core::{CommonParameterProvider, Interceptor, Request};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Interceptor built from [`Config`]
#[derive(Debug, Clone, Default)]
pub struct ConfigInterceptor {
    common: CommonConfig,
    blocked_urls: Vec<String>,
    block_template: Option<Value>,
    offline: bool,
}

impl ConfigInterceptor {
    pub fn from_config(config: &Config) -> Self {
        Self {
            common: config.common.clone(),
            blocked_urls: config.blocked_urls.clone(),
            block_template: config.block_template.clone(),
            offline: false,
        }
    }

    /// Report the network as unavailable
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    fn in_scope(&self, url: &Url) -> bool {
        self.common
            .url_prefix
            .as_deref()
            .map_or(true, |prefix| url.as_str().starts_with(prefix))
    }
}

impl CommonParameterProvider for ConfigInterceptor {
    fn common_headers(&self, url: &Url) -> Vec<(String, String)> {
        if !self.in_scope(url) {
            return Vec::new();
        }
        self.common
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn common_query(&self, url: &Url) -> Vec<(String, String)> {
        if !self.in_scope(url) {
            return Vec::new();
        }
        self.common
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn common_body(&self, url: &Url) -> Vec<(String, Value)> {
        if !self.in_scope(url) {
            return Vec::new();
        }
        self.common
            .body
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Interceptor for ConfigInterceptor {
    fn is_connected(&self) -> bool {
        !self.offline
    }

    fn is_request_allowed(&self, url: &Url) -> bool {
        !self
            .blocked_urls
            .iter()
            .any(|prefix| url.as_str().starts_with(prefix.as_str()))
    }

    fn blocked_response(&self, _url: &Url) -> Option<Value> {
        self.block_template.clone()
    }

    fn on_request(&self, request: &Request) {
        debug!(
            method = %request.method(),
            url = %redaction::redact_sensitive(request.url().as_str()),
            headers = ?redaction::redact_headers(request.headers()),
            "Sending request"
        );
    }

    fn on_response_time(&self, elapsed: Duration, url: &Url, body: &str) {
        info!(
            url = %url.path(),
            elapsed_ms = elapsed.as_millis() as u64,
            body_bytes = body.len(),
            "Response received"
        );
    }

    fn on_success(&self, url: &Url, status: u16, _body: &str) {
        debug!(url = %url.path(), status, "Request succeeded");
    }

    fn on_error(&self, url: &Url, status: u16, body: &str) {
        warn!(
            url = %url.path(),
            status,
            body = %redaction::redact_sensitive(body),
            "Request failed"
        );
    }
}
