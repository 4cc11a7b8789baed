//! Request and response values moved through the pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::codes;
use crate::{Error, Result};

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// Methods that may be answered from a stale cache entry
    ///
    /// Only GET responses are stored, so nothing else can be served offline.
    pub fn is_safe_read(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(Error::configuration(format!("Unsupported HTTP method: {}", other))),
        }
    }
}

/// Per-request opt-outs from common parameter injection
///
/// Fixed when the request is built; the augmenter only reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub skip_all: bool,
    pub skip_headers: bool,
    pub skip_query: bool,
    pub skip_body: bool,
}

impl Capabilities {
    /// Skip every category of common parameters
    pub fn skipping_all() -> Self {
        Self {
            skip_all: true,
            ..Self::default()
        }
    }

    pub fn without_headers(mut self) -> Self {
        self.skip_headers = true;
        self
    }

    pub fn without_query(mut self) -> Self {
        self.skip_query = true;
        self
    }

    pub fn without_body(mut self) -> Self {
        self.skip_body = true;
        self
    }
}

/// Merge policy selected by a body's content-type subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    /// Classify a `Content-Type` value, ignoring parameters and case
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        let subtype = essence
            .split_once('/')
            .map(|(_, sub)| sub.to_ascii_lowercase())
            .unwrap_or_default();

        if subtype == "json" || subtype.ends_with("+json") {
            BodyKind::Json
        } else if subtype == "x-www-form-urlencoded" {
            BodyKind::Form
        } else {
            BodyKind::Other
        }
    }
}

/// Request body with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Body {
    /// JSON body from a value
    pub fn json(value: &Value) -> Self {
        Self::raw(codes::JSON_BODY, value.to_string().into_bytes())
    }

    /// JSON body from already serialized text; the text is not validated
    pub fn json_text(text: impl Into<String>) -> Self {
        Self::raw(codes::JSON_BODY, text.into().into_bytes())
    }

    /// URL-encoded form body
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
        Self::raw(codes::FORM_BODY, serializer.finish().into_bytes())
    }

    /// Body with an arbitrary content type
    pub fn raw(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn kind(&self) -> BodyKind {
        BodyKind::from_content_type(&self.content_type)
    }

    /// Lossy UTF-8 view of the bytes
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// An outgoing request
///
/// Query parameters live in the URL. Headers form an ordered multimap with
/// case-insensitive lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    capabilities: Capabilities,
}

impl Request {
    /// Create a request for an absolute URL
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e))?;
        Ok(Self::from_url(method, parsed))
    }

    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            capabilities: Capabilities::default(),
        }
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    /// Append a query parameter
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json_body(self, value: &Value) -> Self {
        self.with_body(Body::json(value))
    }

    pub fn with_form_body<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.with_body(Body::form(pairs))
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Opt in to being served from a stale cache entry while offline
    pub fn allow_stale_cache(self) -> Self {
        self.with_header(codes::CACHE_DATA, "true")
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn url_string(&self) -> String {
        self.url.to_string()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Replace every value of a header with a single one
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        remove_header(&mut self.headers, &name);
        self.headers.push((name, value.into()));
    }

    pub fn remove_header(&mut self, name: &str) {
        remove_header(&mut self.headers, name);
    }

    /// Append query parameters to the URL
    pub fn append_query<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = self.url.query_pairs_mut();
        for (name, value) in pairs {
            query.append_pair(name, value);
        }
    }

    pub fn set_body(&mut self, body: Option<Body>) {
        self.body = body;
    }
}

/// A response, either from the transport or synthesized by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Send-to-receive time; zero for synthetic responses
    pub elapsed: Duration,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    /// Synthetic JSON response produced without touching the network
    pub fn synthetic_json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string()).with_header(codes::CONTENT_TYPE, codes::JSON_BODY)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn remove_header(&mut self, name: &str) {
        remove_header(&mut self.headers, name);
    }

    /// Status in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Lossy UTF-8 view of the body
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn remove_header(headers: &mut Vec<(String, String)>, name: &str) {
    headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
}
