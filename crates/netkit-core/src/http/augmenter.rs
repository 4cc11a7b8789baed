//! Common parameter injection
//!
//! Headers, query parameters and body fields shared by every request are
//! produced by a [`CommonParameterProvider`] and merged into each request
//! unless the request opted out through its [`Capabilities`].
//!
//! [`Capabilities`]: crate::http::Capabilities

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::http::types::{Body, BodyKind, Request};

/// Source of the parameters shared by every request
///
/// Each category is requested lazily and only when the request has not
/// opted out of it. Every lookup sees the URL as the caller built it, before
/// any common query pairs are appended.
pub trait CommonParameterProvider {
    fn common_headers(&self, _url: &Url) -> Vec<(String, String)> {
        Vec::new()
    }

    fn common_query(&self, _url: &Url) -> Vec<(String, String)> {
        Vec::new()
    }

    fn common_body(&self, _url: &Url) -> Vec<(String, Value)> {
        Vec::new()
    }
}

/// Provider that contributes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommonParameters;

impl CommonParameterProvider for NoCommonParameters {}

/// Merges common parameters into requests
pub struct RequestAugmenter<'a, P: CommonParameterProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: CommonParameterProvider + ?Sized> RequestAugmenter<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Apply headers, query and body in that order
    pub fn augment(&self, mut request: Request) -> Request {
        let capabilities = request.capabilities();
        if capabilities.skip_all {
            return request;
        }
        let url = request.url().clone();

        if !capabilities.skip_headers {
            for (name, value) in self.provider.common_headers(&url) {
                request.add_header(name, value);
            }
        }

        if !capabilities.skip_query {
            let query = self.provider.common_query(&url);
            if !query.is_empty() {
                request.append_query(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
        }

        if !capabilities.skip_body {
            if let Some(body) = request.body() {
                let common = self.provider.common_body(&url);
                if !common.is_empty() {
                    if let Some(merged) = merge_body(body, common) {
                        request.set_body(Some(merged));
                    }
                }
            }
        }

        request
    }
}

/// Merge common fields into a body; `None` leaves the body untouched
fn merge_body(body: &Body, common: Vec<(String, Value)>) -> Option<Body> {
    match body.kind() {
        BodyKind::Json => merge_json(body, common),
        BodyKind::Form => Some(merge_form(body, common)),
        BodyKind::Other => None,
    }
}

fn merge_json(body: &Body, common: Vec<(String, Value)>) -> Option<Body> {
    let mut fields = if body.bytes.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(&body.bytes) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                debug!("JSON body is not an object, skipping common body fields");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "JSON body does not parse, skipping common body fields");
                return None;
            }
        }
    };

    // Caller values win
    for (key, value) in common {
        fields.entry(key).or_insert(value);
    }

    Some(Body::raw(
        body.content_type.clone(),
        Value::Object(fields).to_string().into_bytes(),
    ))
}

fn merge_form(body: &Body, common: Vec<(String, Value)>) -> Body {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in &common {
        serializer.append_pair(key, &form_value(value));
    }
    let encoded = serializer.finish();

    let existing = body.text();
    let merged = if existing.is_empty() {
        encoded
    } else {
        format!("{}&{}", existing, encoded)
    };
    Body::raw(body.content_type.clone(), merged.into_bytes())
}

fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
