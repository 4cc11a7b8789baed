//! Fault classification
//!
//! Maps every [`Fault`] to exactly one [`ApiError`]. There is no rethrow
//! path: the mapping is total.

use tracing::warn;

use crate::codes;
use crate::fault::Fault;
use crate::normalizer::error_from_body;
use crate::result::{ApiError, ErrorKind};

/// Classify a fault into a user-facing error, first match wins
pub fn classify(fault: Fault) -> ApiError {
    let error = match &fault {
        Fault::HttpStatus { status, body } => {
            let body = body.as_deref().unwrap_or(codes::UNKNOWN_ERROR_MESSAGE);
            error_from_body(body, &status.to_string(), status_kind(*status))
        }
        Fault::Timeout => ApiError::new(
            codes::TIMEOUT_ERROR_CODE,
            codes::UNKNOWN_ERROR_MESSAGE,
            ErrorKind::Timeout,
        ),
        Fault::MalformedPayload(reason) => {
            warn!(reason = %reason, "Response payload could not be decoded");
            ApiError::new(
                codes::JSON_EXCEPTION_ERROR_CODE,
                codes::UNKNOWN_ERROR_MESSAGE,
                ErrorKind::MalformedPayload,
            )
        }
        Fault::Unknown(cause) => {
            warn!(cause = %cause, "Unclassified fault");
            ApiError::new(
                codes::UNKNOWN_ERROR_CODE,
                codes::UNKNOWN_ERROR_MESSAGE,
                ErrorKind::UnknownFault,
            )
        }
    };
    error.with_cause(fault)
}

/// Synthetic pipeline statuses keep their own branch of the taxonomy
fn status_kind(status: u16) -> ErrorKind {
    match status {
        codes::API_BLOCKED_STATUS => ErrorKind::BlockedRequest,
        codes::NO_INTERNET_CONNECTION_STATUS => ErrorKind::NoConnectivity,
        other => ErrorKind::HttpError(other),
    }
}
