//! Online/offline routing
//!
//! The gate decides, per request, whether it goes to the network, may only
//! be answered from the cache, or is answered locally with a synthetic
//! envelope. It never fails.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::codes;
use crate::http::types::{Request, Response};

/// Freshness and staleness windows written into `Cache-Control`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub fresh_max_age: Duration,
    pub max_stale: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            fresh_max_age: Duration::from_secs(5),
            max_stale: Duration::from_secs(60 * 60 * 24 * 7),
        }
    }
}

impl CachePolicy {
    /// Directive for requests sent while online
    pub fn online_directive(&self) -> String {
        format!("public, max-age={}", self.fresh_max_age.as_secs())
    }

    /// Directive for requests that may only be served from the cache
    pub fn offline_directive(&self) -> String {
        format!("public, only-if-cached, max-stale={}", self.max_stale.as_secs())
    }
}

/// Outcome of routing a request
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectivityDecision {
    /// Send to the network
    Proceed(Request),
    /// Offline, but a stale cache entry may answer
    ProceedFromCache(Request),
    /// Answer locally without dispatching
    Block(Response),
}

/// Routes requests by block status and connectivity
#[derive(Debug, Clone, Default)]
pub struct ConnectivityGate {
    policy: CachePolicy,
    block_template: Option<Value>,
}

impl ConnectivityGate {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            block_template: None,
        }
    }

    /// Body to answer blocked requests with; `None` keeps the default
    pub fn with_block_template(mut self, template: Option<Value>) -> Self {
        self.block_template = template;
        self
    }

    /// Decide how a request is dispatched; blocking beats connectivity
    pub fn route(&self, mut request: Request, is_blocked: bool, is_online: bool) -> ConnectivityDecision {
        if is_blocked {
            debug!(url = %request.url(), "Request blocked");
            return ConnectivityDecision::Block(self.blocked_response());
        }

        if is_online {
            request.set_header(codes::CACHE_CONTROL, self.policy.online_directive());
            return ConnectivityDecision::Proceed(request);
        }

        if request.method().is_safe_read() && request.has_header(codes::CACHE_DATA) {
            debug!(url = %request.url(), "Offline, allowing stale cache");
            request.set_header(codes::CACHE_CONTROL, self.policy.offline_directive());
            return ConnectivityDecision::ProceedFromCache(request);
        }

        debug!(url = %request.url(), "Offline, no cache fallback");
        ConnectivityDecision::Block(offline_response())
    }

    /// Synthetic response for a refused request
    pub fn blocked_response(&self) -> Response {
        let body = self.block_template.clone().unwrap_or_else(default_block_body);
        Response::synthetic_json(codes::API_BLOCKED_STATUS, &body)
    }
}

/// Envelope returned for blocked requests without a custom template
pub fn default_block_body() -> Value {
    json!({
        "status": codes::API_FAIL_STATUS,
        "type": "none",
        "message": codes::REQUEST_BLOCKED,
        "error": 1010,
    })
}

/// Synthetic response for an offline request with no cache fallback
pub fn offline_response() -> Response {
    let body = json!({
        "status": codes::API_FAIL_STATUS,
        "message": codes::INTERNET_UNAVAILABLE,
        "error": 1009,
    });
    Response::synthetic_json(codes::NO_INTERNET_CONNECTION_STATUS, &body)
}
