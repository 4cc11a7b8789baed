//! Transport seam between the pipeline and the network

use tracing::debug;

use crate::config::NetworkParams;
use crate::fault::Fault;
use crate::http::cache::{CacheLookup, ResponseCache};
use crate::http::types::{Method, Request, Response};
use crate::{codes, Error, Result};

/// Sends a fully prepared request
///
/// Implementations must not interpret the status code: every response the
/// server produced is returned as `Ok`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> std::result::Result<Response, Fault>;
}

/// Transport backed by `reqwest`'s blocking client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    cache: Option<ResponseCache>,
}

impl ReqwestTransport {
    /// Build a client honouring the connect and total timeouts
    pub fn new(params: &NetworkParams) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(params.connect_timeout())
            .timeout(params.total_timeout())
            .build()
            .map_err(|e| Error::HttpClient {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        let cache = params
            .cache
            .enabled
            .then(|| ResponseCache::new(params.cache.max_size_bytes));

        Ok(Self { client, cache })
    }

    /// Wrap an existing client without a cache
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client, cache: None }
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    fn send(&self, request: &Request) -> std::result::Result<Response, Fault> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method()), request.url().clone());

        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            if !request.has_header(codes::CONTENT_TYPE) {
                builder = builder.header(codes::CONTENT_TYPE, body.content_type.as_str());
            }
            builder = builder.body(body.bytes.clone());
        }

        let response = builder.send().map_err(fault_from_reqwest)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().map_err(fault_from_reqwest)?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
            elapsed: Default::default(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &Request) -> std::result::Result<Response, Fault> {
        if let Some(cache) = &self.cache {
            match cache.lookup(request) {
                Some(CacheLookup::Hit(response)) => return Ok(response),
                Some(CacheLookup::Unsatisfiable) => {
                    debug!(url = %request.url(), "Nothing cached for offline request");
                    return Ok(ResponseCache::gateway_timeout());
                }
                None => {}
            }
        }

        let response = self.send(request)?;
        if let Some(cache) = &self.cache {
            cache.store(request, &response);
        }
        Ok(response)
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn fault_from_reqwest(err: reqwest::Error) -> Fault {
    if err.is_timeout() {
        Fault::Timeout
    } else {
        Fault::unknown(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_default_params_has_cache() {
        let transport = ReqwestTransport::new(&NetworkParams::default()).unwrap();
        assert!(transport.cache().is_some());
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let mut params = NetworkParams::default();
        params.cache.enabled = false;
        let transport = ReqwestTransport::new(&params).unwrap();
        assert!(transport.cache().is_none());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(reqwest_method(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(reqwest_method(Method::Head), reqwest::Method::HEAD);
    }
}
