//! The network client
//!
//! A [`NetworkClient`] is built once and shared as an immutable handle. It
//! owns the transport and the interceptors and turns a [`Request`] into an
//! [`ApiResult`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::classifier::classify;
use crate::codes;
use crate::config::NetworkParams;
use crate::envelope::Envelope;
use crate::fault::Fault;
use crate::http::{
    Body, CachePolicy, InterceptChain, Interceptor, Method, ReqwestTransport, Request, Response,
    Transport,
};
use crate::logging::log_api_result;
use crate::normalizer::{normalize, normalize_boolean, normalize_raw};
use crate::result::{ApiError, ApiResult, BooleanResult, ErrorKind};
use crate::{Error, Result};

/// Notified of every fault the client classifies
pub trait ErrorListener: Send + Sync {
    /// `called_from` is the URL of the failing request
    fn on_error(&self, fault: &Fault, called_from: &str);
}

/// Immutable, shareable handle over the request pipeline
pub struct NetworkClient {
    params: NetworkParams,
    base_url: Option<Url>,
    policy: CachePolicy,
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn Transport>,
    error_listener: Option<Arc<dyn ErrorListener>>,
}

impl std::fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClient")
            .field("params", &self.params)
            .field("interceptors", &self.interceptors.len())
            .field("error_listener", &self.error_listener.is_some())
            .finish()
    }
}

impl NetworkClient {
    pub fn builder() -> NetworkClientBuilder {
        NetworkClientBuilder::default()
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Build a request; relative paths are joined to the base URL
    pub fn request(&self, method: Method, path: &str) -> Result<Request> {
        if let Ok(url) = Url::parse(path) {
            return Ok(Request::from_url(method, url));
        }
        let base = self.base_url.as_ref().ok_or_else(|| {
            Error::configuration(format!("No base_url configured for relative path '{}'", path))
        })?;
        let url = base.join(path).map_err(|e| Error::invalid_url(path, e))?;
        Ok(Request::from_url(method, url))
    }

    /// Run the interceptor chain and return the raw response
    pub fn execute(&self, request: Request) -> std::result::Result<Response, Fault> {
        InterceptChain::new(&self.interceptors, self.transport.as_ref(), &self.policy)
            .proceed(request)
    }

    /// Call an enveloped endpoint and decode its payload into `T`
    pub fn call<T: DeserializeOwned>(&self, request: Request) -> ApiResult<T> {
        self.call_enveloped(request, normalize::<T>)
    }

    /// Call an endpoint where only success or failure matters
    pub fn call_boolean(&self, request: Request) -> BooleanResult {
        self.call_enveloped(request, normalize_boolean)
    }

    /// Call an endpoint whose body is the payload itself
    ///
    /// An empty or `null` body is an unknown error.
    pub fn call_raw<T: DeserializeOwned>(&self, request: Request) -> ApiResult<T> {
        let called_from = request.url_string();
        let result = match self.fetch(request) {
            Err(fault) => ApiResult::Error(classify(fault)),
            Ok(body) if is_blank(&body) => normalize_raw(None),
            Ok(body) => match serde_json::from_slice::<Option<T>>(&body) {
                Ok(value) => normalize_raw(value),
                Err(e) => ApiResult::Error(classify(Fault::from(e))),
            },
        };
        self.finish(&called_from, result)
    }

    /// `GET` with query parameters
    pub fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        match self.request(Method::Get, path) {
            Ok(mut request) => {
                request.append_query(query.iter().copied());
                self.call(request)
            }
            Err(e) => self.setup_failure(path, e),
        }
    }

    /// `POST` with a JSON body
    pub fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> ApiResult<T> {
        self.send_body(Method::Post, path, Body::json(body))
    }

    /// `PUT` with a JSON body
    pub fn put<T: DeserializeOwned>(&self, path: &str, body: &Value) -> ApiResult<T> {
        self.send_body(Method::Put, path, Body::json(body))
    }

    /// `POST` with a form body
    pub fn post_form<T: DeserializeOwned>(&self, path: &str, fields: &[(&str, &str)]) -> ApiResult<T> {
        self.send_body(Method::Post, path, Body::form(fields.iter().copied()))
    }

    fn send_body<T: DeserializeOwned>(&self, method: Method, path: &str, body: Body) -> ApiResult<T> {
        match self.request(method, path) {
            Ok(request) => self.call(request.with_body(body)),
            Err(e) => self.setup_failure(path, e),
        }
    }

    fn setup_failure<T>(&self, path: &str, error: Error) -> ApiResult<T> {
        self.finish(path, ApiResult::Error(classify(Fault::unknown(error))))
    }

    fn call_enveloped<T, F>(&self, request: Request, normalize: F) -> ApiResult<T>
    where
        F: FnOnce(&Envelope) -> ApiResult<T>,
    {
        let called_from = request.url_string();
        let result = match self.fetch(request) {
            Err(fault) => ApiResult::Error(classify(fault)),
            Ok(body) if is_blank(&body) => ApiResult::Error(ApiError::new(
                codes::UNKNOWN_ERROR_CODE,
                codes::UNKNOWN_ERROR_MESSAGE,
                ErrorKind::EnvelopeError,
            )),
            Ok(body) => match Envelope::from_slice(&body) {
                Ok(envelope) => normalize(&envelope),
                Err(fault) => ApiResult::Error(classify(fault)),
            },
        };
        self.finish(&called_from, result)
    }

    /// Body of a 2xx response; anything else is a fault
    fn fetch(&self, request: Request) -> std::result::Result<Vec<u8>, Fault> {
        let response = self.execute(request)?;
        if !response.is_success() {
            let body = response.text().into_owned();
            return Err(Fault::HttpStatus {
                status: response.status,
                body: Some(body),
            });
        }
        Ok(response.body)
    }

    fn finish<T>(&self, called_from: &str, result: ApiResult<T>) -> ApiResult<T> {
        if let (Some(listener), ApiResult::Error(error)) = (&self.error_listener, &result) {
            if let Some(fault) = &error.cause {
                listener.on_error(fault, called_from);
            }
        }
        log_api_result(called_from, &result);
        result
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// Builder for [`NetworkClient`]
#[derive(Default)]
pub struct NetworkClientBuilder {
    params: NetworkParams,
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Option<Arc<dyn Transport>>,
    error_listener: Option<Arc<dyn ErrorListener>>,
}

impl NetworkClientBuilder {
    pub fn params(mut self, params: NetworkParams) -> Self {
        self.params = params;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.params.base_url = Some(base_url.into());
        self
    }

    /// Add an interceptor; the first one added is the outermost stage
    pub fn interceptor(self, interceptor: impl Interceptor + 'static) -> Self {
        self.shared_interceptor(Arc::new(interceptor))
    }

    pub fn shared_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Replace the default `reqwest` transport
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn error_listener(mut self, listener: impl ErrorListener + 'static) -> Self {
        self.error_listener = Some(Arc::new(listener));
        self
    }

    pub fn build(self) -> Result<NetworkClient> {
        self.params.validate()?;
        let base_url = self.params.parsed_base_url()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.params)?),
        };

        info!(
            base_url = base_url.as_ref().map(Url::as_str).unwrap_or("<none>"),
            interceptors = self.interceptors.len(),
            "Network client created"
        );

        Ok(NetworkClient {
            policy: self.params.cache_policy(),
            params: self.params,
            base_url,
            interceptors: self.interceptors,
            transport,
            error_listener: self.error_listener,
        })
    }
}
