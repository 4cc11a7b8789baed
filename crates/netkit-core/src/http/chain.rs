//! Interceptor chain
//!
//! Every [`Interceptor`] is one stage; stage *i* wraps stage *i + 1* and
//! the innermost call goes to the [`Transport`]. Each stage augments the
//! request, routes it through the [`ConnectivityGate`], dispatches it, and
//! then inspects the response on the way back out.

use flate2::read::GzDecoder;
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::codes;
use crate::fault::Fault;
use crate::http::augmenter::{CommonParameterProvider, RequestAugmenter};
use crate::http::gate::{CachePolicy, ConnectivityDecision, ConnectivityGate};
use crate::http::transport::Transport;
use crate::http::types::{Request, Response};

/// Pipeline stage with collaborator probes and observation hooks
///
/// Every method has a neutral default, so implementors only override what
/// they need. Hooks observe; they cannot change the response.
pub trait Interceptor: CommonParameterProvider + Send + Sync {
    /// Connectivity probe, asked once per dispatch
    fn is_connected(&self) -> bool {
        true
    }

    /// Block predicate; a refused request never reaches the network
    fn is_request_allowed(&self, _url: &Url) -> bool {
        true
    }

    /// Body for refused requests; `None` uses the default envelope
    fn blocked_response(&self, _url: &Url) -> Option<Value> {
        None
    }

    /// Called with the augmented request before routing
    fn on_request(&self, _request: &Request) {}

    /// Send-to-receive time of a dispatched request
    fn on_response_time(&self, _elapsed: Duration, _url: &Url, _body: &str) {}

    fn on_success(&self, _url: &Url, _status: u16, _body: &str) {}

    /// Also called for refused requests, with the synthetic status
    fn on_error(&self, _url: &Url, _status: u16, _body: &str) {}

    fn is_success_status(&self, status: u16) -> bool {
        (200..=299).contains(&status)
    }
}

/// One pass of a request through the interceptors and the transport
pub struct InterceptChain<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
    policy: &'a CachePolicy,
}

impl<'a> InterceptChain<'a> {
    pub fn new(
        interceptors: &'a [Arc<dyn Interceptor>],
        transport: &'a dyn Transport,
        policy: &'a CachePolicy,
    ) -> Self {
        Self {
            interceptors,
            transport,
            policy,
        }
    }

    /// Run the request through every stage
    ///
    /// Transport failures propagate unchanged; there is no retry.
    pub fn proceed(&self, request: Request) -> Result<Response, Fault> {
        let mut response = self.proceed_at(0, request)?;
        // Without interceptors no stage has decoded the body yet
        decode_gzip(&mut response);
        Ok(response)
    }

    fn proceed_at(&self, index: usize, request: Request) -> Result<Response, Fault> {
        match self.interceptors.get(index) {
            Some(interceptor) => self.intercept(interceptor.as_ref(), index, request),
            None => self.dispatch(request),
        }
    }

    fn intercept(
        &self,
        interceptor: &dyn Interceptor,
        index: usize,
        request: Request,
    ) -> Result<Response, Fault> {
        // Hooks and the allow predicate see the URL as this stage received it
        let url = request.url().clone();
        let request = RequestAugmenter::new(interceptor).augment(request);
        interceptor.on_request(&request);

        let allowed = interceptor.is_request_allowed(&url);
        let online = allowed && interceptor.is_connected();

        let mut gate = ConnectivityGate::new(*self.policy);
        if !allowed {
            gate = gate.with_block_template(interceptor.blocked_response(&url));
        }

        let request = match gate.route(request, !allowed, online) {
            ConnectivityDecision::Proceed(request)
            | ConnectivityDecision::ProceedFromCache(request) => request,
            ConnectivityDecision::Block(response) => {
                if !allowed {
                    interceptor.on_error(&url, response.status, &response.text());
                }
                return Ok(response);
            }
        };

        let mut response = self.proceed_at(index + 1, request)?;
        debug!(url = %url, status = response.status, "Response received");
        interceptor.on_response_time(response.elapsed, &url, &response.text());

        decode_gzip(&mut response);

        let body = response.text();
        if interceptor.is_success_status(response.status) {
            interceptor.on_success(&url, response.status, &body);
        } else {
            interceptor.on_error(&url, response.status, &body);
        }

        Ok(response)
    }

    fn dispatch(&self, request: Request) -> Result<Response, Fault> {
        debug!(method = %request.method(), url = %request.url(), "Dispatching request");
        let started = Instant::now();
        let mut response = self.transport.execute(&request)?;
        response.elapsed = started.elapsed();
        Ok(response)
    }
}

/// Decompress a gzip-encoded body in place
///
/// A body that fails to decompress becomes empty. The encoding header is
/// removed either way so the body is never decoded twice.
pub fn decode_gzip(response: &mut Response) {
    let is_gzip = response
        .header(codes::CONTENT_ENCODING)
        .map(|encoding| encoding.trim().eq_ignore_ascii_case("gzip"))
        .unwrap_or(false);
    if !is_gzip {
        return;
    }

    let mut decoded = Vec::new();
    match GzDecoder::new(response.body.as_slice()).read_to_end(&mut decoded) {
        Ok(_) => {
            debug!(bytes = decoded.len(), "Decoded gzip body");
            response.body = decoded;
        }
        Err(e) => {
            warn!(error = %e, "Failed to decode gzip body, continuing with an empty body");
            response.body.clear();
        }
    }
    response.remove_header(codes::CONTENT_ENCODING);
}
