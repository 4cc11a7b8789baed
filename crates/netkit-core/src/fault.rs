//! Failures captured while a call is in flight
//!
//! A [`Fault`] is built where a failure is caught (transport, status check,
//! decoding) and handed straight to [`crate::classifier::classify`]. It is
//! never persisted beyond the `cause` of the resulting error.

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Internal representation of a failure prior to classification
#[derive(Debug, Clone, Error)]
pub enum Fault {
    /// The transport or a delivery adapter gave up waiting
    #[error("request timed out")]
    Timeout,

    /// The server answered with a status outside the success range
    #[error("HTTP status {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// A body could not be decoded into the expected shape
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Anything else; the underlying error is kept for diagnostics
    #[error("unknown fault: {0}")]
    Unknown(Arc<dyn StdError + Send + Sync>),
}

impl Fault {
    /// Wrap an arbitrary error as an unknown fault
    pub fn unknown<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Fault::Unknown(Arc::new(error))
    }

    /// Build an unknown fault from a plain message
    pub fn unknown_message(message: impl Into<String>) -> Self {
        let boxed: Box<dyn StdError + Send + Sync> = message.into().into();
        Fault::Unknown(Arc::from(boxed))
    }

    /// Short, stable name of the variant, used in logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Fault::Timeout => "timeout",
            Fault::HttpStatus { .. } => "http_status",
            Fault::MalformedPayload(_) => "malformed_payload",
            Fault::Unknown(_) => "unknown",
        }
    }
}

impl PartialEq for Fault {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Fault::Timeout, Fault::Timeout) => true,
            (
                Fault::HttpStatus { status: a, body: body_a },
                Fault::HttpStatus { status: b, body: body_b },
            ) => a == b && body_a == body_b,
            (Fault::MalformedPayload(a), Fault::MalformedPayload(b)) => a == b,
            (Fault::Unknown(a), Fault::Unknown(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Fault {
    fn from(err: serde_json::Error) -> Self {
        Fault::MalformedPayload(err.to_string())
    }
}
