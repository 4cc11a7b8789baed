//! Unified call result
//!
//! Every dispatched call ends in exactly one [`ApiResult`]: a payload with
//! its (possibly empty) message, or an [`ApiError`] whose code and message
//! are never empty.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::codes;
use crate::envelope::Envelope;
use crate::fault::Fault;

/// Taxonomy of user-visible failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The interceptor refused to let the request out
    BlockedRequest,
    /// Offline and no cached answer allowed
    NoConnectivity,
    /// Transport or adapter timeout
    Timeout,
    /// Non-success HTTP status
    HttpError(u16),
    /// Body could not be decoded
    MalformedPayload,
    /// The envelope itself reported a failure
    EnvelopeError,
    /// Anything unclassified
    UnknownFault,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::BlockedRequest => write!(f, "blocked_request"),
            ErrorKind::NoConnectivity => write!(f, "no_connectivity"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::HttpError(status) => write!(f, "http_error({})", status),
            ErrorKind::MalformedPayload => write!(f, "malformed_payload"),
            ErrorKind::EnvelopeError => write!(f, "envelope_error"),
            ErrorKind::UnknownFault => write!(f, "unknown_fault"),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Error variant of [`ApiResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("[{code}] {message}")]
pub struct ApiError {
    /// Backend or pipeline error code, never empty
    pub code: String,
    /// Human readable message, never empty
    pub message: String,
    /// Which branch of the taxonomy produced this error
    pub kind: ErrorKind,
    /// The envelope the error was extracted from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_envelope: Option<Envelope>,
    /// The fault that caused this error, if any
    #[serde(skip)]
    pub cause: Option<Fault>,
}

impl ApiError {
    /// Create an error; blank codes and messages fall back to the unknown
    /// sentinels
    pub fn new(code: impl Into<String>, message: impl Into<String>, kind: ErrorKind) -> Self {
        let code = code.into();
        let message = message.into();
        Self {
            code: if code.trim().is_empty() {
                codes::UNKNOWN_ERROR_CODE.to_string()
            } else {
                code
            },
            message: if message.trim().is_empty() {
                codes::UNKNOWN_ERROR_MESSAGE.to_string()
            } else {
                message
            },
            kind,
            raw_envelope: None,
            cause: None,
        }
    }

    /// The generic unknown error
    pub fn unknown() -> Self {
        Self::new(
            codes::UNKNOWN_ERROR_CODE,
            codes::UNKNOWN_ERROR_MESSAGE,
            ErrorKind::UnknownFault,
        )
    }

    /// Attach the envelope the error came from
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.raw_envelope = Some(envelope);
        self
    }

    /// Attach the originating fault
    pub fn with_cause(mut self, fault: Fault) -> Self {
        self.cause = Some(fault);
        self
    }
}

/// Unified success/error result of a call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ApiResult<T> {
    /// Payload with the message extracted from the envelope (may be empty)
    Success { payload: T, message: String },
    /// Populated error
    Error(ApiError),
}

/// Result of endpoints where only success or failure matters
pub type BooleanResult = ApiResult<bool>;

/// Receiver for callback-style delivery
pub trait ResponseListener<T> {
    /// Called once with the payload of a successful call
    fn on_success(&self, payload: T, message: String);

    /// Called once with the error of a failed call
    fn on_error(&self, error: ApiError);
}

impl<T> ApiResult<T> {
    /// Successful result
    pub fn success(payload: T, message: impl Into<String>) -> Self {
        ApiResult::Success {
            payload,
            message: message.into(),
        }
    }

    /// Check for the success variant
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    /// Borrow the payload, if any
    pub fn payload(&self) -> Option<&T> {
        match self {
            ApiResult::Success { payload, .. } => Some(payload),
            ApiResult::Error(_) => None,
        }
    }

    /// Borrow the error, if any
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Error(error) => Some(error),
        }
    }

    /// Message of either variant
    pub fn message(&self) -> &str {
        match self {
            ApiResult::Success { message, .. } => message,
            ApiResult::Error(error) => &error.message,
        }
    }

    /// Map the payload, keeping errors untouched
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResult<U> {
        match self {
            ApiResult::Success { payload, message } => ApiResult::Success {
                payload: f(payload),
                message,
            },
            ApiResult::Error(error) => ApiResult::Error(error),
        }
    }

    /// Convert into a standard `Result`, dropping the success message
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            ApiResult::Success { payload, .. } => Ok(payload),
            ApiResult::Error(error) => Err(error),
        }
    }

    /// Route the result to a listener
    pub fn dispatch<L: ResponseListener<T> + ?Sized>(self, listener: &L) {
        match self {
            ApiResult::Success { payload, message } => listener.on_success(payload, message),
            ApiResult::Error(error) => listener.on_error(error),
        }
    }
}

impl<T> From<ApiError> for ApiResult<T> {
    fn from(error: ApiError) -> Self {
        ApiResult::Error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_blank_code_and_message_fall_back() {
        let err = ApiError::new("", "  ", ErrorKind::EnvelopeError);
        assert_eq!(err.code, codes::UNKNOWN_ERROR_CODE);
        assert_eq!(err.message, codes::UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::new("1003", "Invalid token", ErrorKind::EnvelopeError);
        assert_eq!(err.to_string(), "[1003] Invalid token");
    }

    #[test]
    fn test_into_result() {
        let ok: ApiResult<u32> = ApiResult::success(5, "");
        assert_eq!(ok.into_result().unwrap(), 5);

        let err: ApiResult<u32> = ApiError::unknown().into();
        assert_eq!(err.into_result().unwrap_err().code, "1000");
    }

    #[test]
    fn test_serialize_success() {
        let result: ApiResult<u32> = ApiResult::success(5, "ok");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["result"], "success");
        assert_eq!(json["payload"], 5);
        assert_eq!(json["message"], "ok");
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl ResponseListener<u32> for Recorder {
        fn on_success(&self, payload: u32, message: String) {
            self.events.borrow_mut().push(format!("ok:{}:{}", payload, message));
        }

        fn on_error(&self, error: ApiError) {
            self.events.borrow_mut().push(format!("err:{}", error.code));
        }
    }

    #[test]
    fn test_dispatch_to_listener() {
        let recorder = Recorder::default();
        ApiResult::success(7, "done").dispatch(&recorder);
        ApiResult::<u32>::Error(ApiError::unknown()).dispatch(&recorder);
        assert_eq!(*recorder.events.borrow(), vec!["ok:7:done", "err:1000"]);
    }
}
