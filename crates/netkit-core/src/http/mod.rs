//! HTTP request pipeline
//!
//! This module provides:
//! - Request and response values moved through the pipeline
//! - Common parameter injection honoring per-request opt-outs
//! - Online/offline routing with stale-cache fallback
//! - The interceptor chain with gzip handling and response hooks
//! - The transport seam and a `reqwest`-backed implementation with an
//!   in-memory response cache

pub mod augmenter;
pub mod cache;
pub mod chain;
pub mod gate;
pub mod transport;
pub mod types;

pub use augmenter::{CommonParameterProvider, NoCommonParameters, RequestAugmenter};
pub use cache::{CacheDirectives, CacheLookup, ResponseCache};
pub use chain::{decode_gzip, InterceptChain, Interceptor};
pub use gate::{CachePolicy, ConnectivityDecision, ConnectivityGate};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Body, BodyKind, Capabilities, Method, Request, Response};
