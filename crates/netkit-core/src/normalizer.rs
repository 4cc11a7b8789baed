//! Envelope normalization
//!
//! Turns a decoded [`Envelope`] into an [`ApiResult`]. The rules are pure
//! and deterministic: the same envelope always yields the same result.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::classifier::classify;
use crate::codes;
use crate::envelope::Envelope;
use crate::fault::Fault;
use crate::result::{ApiError, ApiResult, BooleanResult, ErrorKind};

/// Normalize an envelope whose payload decodes into `T`
///
/// The payload is `response` when non-null, else `data`. A successful
/// envelope without any payload is reported as an error.
pub fn normalize<T: DeserializeOwned>(envelope: &Envelope) -> ApiResult<T> {
    if !envelope.is_success() {
        return ApiResult::Error(envelope_error(
            envelope,
            codes::UNKNOWN_ERROR_CODE,
            ErrorKind::EnvelopeError,
        ));
    }

    let Some(payload) = envelope.payload() else {
        debug!("Envelope reports success but carries no payload");
        return ApiResult::Error(envelope_error(
            envelope,
            codes::UNKNOWN_ERROR_CODE,
            ErrorKind::EnvelopeError,
        ));
    };

    match serde_json::from_value::<T>(payload.clone()) {
        Ok(payload) => ApiResult::success(payload, envelope.response_message()),
        Err(e) => ApiResult::Error(classify(Fault::from(e)).with_envelope(envelope.clone())),
    }
}

/// Normalize an envelope where only success or failure matters
pub fn normalize_boolean(envelope: &Envelope) -> BooleanResult {
    if envelope.is_success() {
        ApiResult::success(true, envelope.response_message())
    } else {
        ApiResult::Error(envelope_error(
            envelope,
            codes::UNKNOWN_ERROR_CODE,
            ErrorKind::EnvelopeError,
        ))
    }
}

/// Wrap a value decoded without an envelope
pub fn normalize_raw<T>(value: Option<T>) -> ApiResult<T> {
    match value {
        Some(payload) => ApiResult::success(payload, ""),
        None => ApiResult::Error(ApiError::unknown()),
    }
}

/// Extract code and message from an envelope that did not succeed
pub fn envelope_error(envelope: &Envelope, fallback_code: &str, kind: ErrorKind) -> ApiError {
    ApiError::new(
        envelope.response_error_code(fallback_code),
        envelope.response_message(),
        kind,
    )
    .with_envelope(envelope.clone())
}

/// Extract an error from a raw body
///
/// Blank bodies yield the generic message, JSON objects go through
/// [`envelope_error`], and any other text becomes the message verbatim.
pub fn error_from_body(body: &str, fallback_code: &str, kind: ErrorKind) -> ApiError {
    if body.trim().is_empty() {
        return ApiError::new(fallback_code, codes::UNKNOWN_ERROR_MESSAGE, kind);
    }
    match Envelope::parse(body) {
        Some(envelope) => envelope_error(&envelope, fallback_code, kind),
        None => ApiError::new(fallback_code, body, kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    fn envelope(value: Value) -> Envelope {
        Envelope::from_value(value).unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u32,
        name: String,
    }

    #[test]
    fn test_success_with_data() {
        let env = envelope(json!({"success": true, "data": 5}));
        assert_eq!(normalize::<u32>(&env), ApiResult::success(5, ""));
    }

    #[test]
    fn test_response_preferred_over_data() {
        let env = envelope(json!({
            "status": "success",
            "message": "Loaded",
            "response": {"id": 1, "name": "Ada"},
            "data": {"id": 2, "name": "Bob"}
        }));
        let result = normalize::<User>(&env);
        assert_eq!(
            result,
            ApiResult::success(User { id: 1, name: "Ada".to_string() }, "Loaded")
        );
    }

    #[test]
    fn test_success_without_payload_is_error() {
        let env = envelope(json!({"status": "success", "response": null}));
        let err = normalize::<Value>(&env).into_result().unwrap_err();
        assert_eq!(err.code, codes::UNKNOWN_ERROR_CODE);
        assert_eq!(err.kind, ErrorKind::EnvelopeError);
        assert_eq!(err.raw_envelope, Some(env));
    }

    #[test]
    fn test_failed_envelope_extracts_code_and_message() {
        let env = envelope(json!({"status": "fail", "message": "Invalid token", "error": 1003}));
        let err = normalize::<Value>(&env).into_result().unwrap_err();
        assert_eq!(err.code, "1003");
        assert_eq!(err.message, "Invalid token");
    }

    #[test]
    fn test_no_predicate_key_uses_sentinel() {
        let env = envelope(json!({"response": {"id": 1}}));
        let err = normalize::<Value>(&env).into_result().unwrap_err();
        assert_eq!(err.code, codes::UNKNOWN_ERROR_CODE);
        assert_eq!(err.message, codes::UNKNOWN_ERROR_MESSAGE);

        let env = envelope(json!({"code": "404"}));
        let err = normalize::<Value>(&env).into_result().unwrap_err();
        assert_eq!(err.code, "404");
    }

    #[test]
    fn test_payload_type_mismatch_is_json_exception() {
        let env = envelope(json!({"status": "success", "data": "not a user"}));
        let err = normalize::<User>(&env).into_result().unwrap_err();
        assert_eq!(err.code, codes::JSON_EXCEPTION_ERROR_CODE);
        assert_eq!(err.kind, ErrorKind::MalformedPayload);
        assert!(err.raw_envelope.is_some());
    }

    #[test]
    fn test_string_response_is_message() {
        let env = envelope(json!({"status": "1", "response": "Profile saved"}));
        assert_eq!(
            normalize::<String>(&env),
            ApiResult::success("Profile saved".to_string(), "Profile saved")
        );
    }

    #[test]
    fn test_boolean_ignores_missing_payload() {
        let env = envelope(json!({"status": "success", "message": "Deleted"}));
        assert_eq!(normalize_boolean(&env), ApiResult::success(true, "Deleted"));

        let env = envelope(json!({"status": "fail", "code": "77"}));
        let err = normalize_boolean(&env).into_result().unwrap_err();
        assert_eq!(err.code, "77");
    }

    #[test]
    fn test_normalize_raw() {
        assert_eq!(normalize_raw(Some(3)), ApiResult::success(3, ""));
        let err = normalize_raw::<u8>(None).into_result().unwrap_err();
        assert_eq!(err.code, codes::UNKNOWN_ERROR_CODE);
    }

    #[test]
    fn test_error_from_body_variants() {
        let err = error_from_body("", "503", ErrorKind::HttpError(503));
        assert_eq!((err.code.as_str(), err.message.as_str()), ("503", codes::UNKNOWN_ERROR_MESSAGE));

        let err = error_from_body("Bad Gateway", "502", ErrorKind::HttpError(502));
        assert_eq!((err.code.as_str(), err.message.as_str()), ("502", "Bad Gateway"));
        assert!(err.raw_envelope.is_none());

        let err = error_from_body(
            r#"{"message":"Session expired","error":401}"#,
            "401",
            ErrorKind::HttpError(401),
        );
        assert_eq!((err.code.as_str(), err.message.as_str()), ("401", "Session expired"));
        assert!(err.raw_envelope.is_some());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let env = envelope(json!({"status": "fail", "message": "Nope", "code": "12"}));
        assert_eq!(normalize::<Value>(&env), normalize::<Value>(&env));
    }
}
