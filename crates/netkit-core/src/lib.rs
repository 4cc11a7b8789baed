//! Netkit Core - client-side HTTP middleware with envelope normalization
//!
//! This crate augments outgoing requests with common parameters, routes
//! them by connectivity with a stale-cache fallback, and normalizes the
//! loosely shaped JSON envelopes backends return into one result type.
//!
//! # Main Components
//!
//! - **Request pipeline** ([`http`]): augmentation, connectivity gate,
//!   interceptor chain, gzip handling and the transport seam
//! - **Normalization** ([`normalizer`]): envelope to [`ApiResult`]
//! - **Classification** ([`classifier`]): [`Fault`] to [`ApiError`]
//! - **Client** ([`NetworkClient`]): the shared handle tying it together
//! - **Delivery** ([`delivery`]): future and callback adapters
//!
//! # Example
//!
//! ```no_run
//! use netkit_core::{Method, NetworkClient, NetworkParams, Result};
//! use serde_json::Value;
//!
//! fn example() -> Result<()> {
//!     let client = NetworkClient::builder()
//!         .params(NetworkParams::default().with_base_url("https://api.example.com/v1/"))
//!         .build()?;
//!
//!     let request = client.request(Method::Get, "profile")?.allow_stale_cache();
//!     match client.call::<Value>(request).into_result() {
//!         Ok(profile) => println!("{}", profile),
//!         Err(e) => eprintln!("{}", e),
//!     }
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod client;
pub mod codes;
pub mod config;
pub mod delivery;
pub mod envelope;
pub mod error;
pub mod fault;
pub mod http;
pub mod logging;
pub mod normalizer;
pub mod result;

// Re-export main types for convenience
pub use classifier::classify;
pub use client::{ErrorListener, NetworkClient, NetworkClientBuilder};
pub use config::{CacheConfig, NetworkParams};
pub use delivery::{call_async, call_boolean_async, enqueue, CallHandle};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use fault::Fault;
pub use http::{
    Body, CachePolicy, Capabilities, CommonParameterProvider, ConnectivityDecision,
    ConnectivityGate, Interceptor, Method, Request, RequestAugmenter, Response, ReqwestTransport,
    Transport,
};
pub use normalizer::{normalize, normalize_boolean};
pub use result::{ApiError, ApiResult, BooleanResult, ErrorKind, ResponseListener};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
