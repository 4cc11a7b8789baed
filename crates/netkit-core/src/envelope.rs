//! Decoded backend response envelopes
//!
//! Backends wrap their payloads in loosely shaped JSON objects. An
//! [`Envelope`] keeps the whole decoded object and exposes the keys the
//! normalizer understands: `status`, `success`, `response`, `data`,
//! `message`, `error`, `type` and `code`. None of them is mandatory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codes;
use crate::fault::Fault;

/// Decoded top-level JSON object returned by a backend endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    /// Wrap an already decoded JSON object
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value if it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Decode raw body bytes; anything but a JSON object is a malformed payload
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Fault> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value).ok_or_else(|| {
            Fault::MalformedPayload("response body is not a JSON object".to_string())
        })
    }

    /// Lenient parse used on error paths: `None` for anything but an object
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str::<Value>(text).ok().and_then(Self::from_value)
    }

    /// Look up a key, treating JSON `null` as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// `status`, accepting both string and numeric encodings
    pub fn status(&self) -> Option<String> {
        match self.get(codes::STATUS)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `success` when it is a JSON boolean
    pub fn success(&self) -> Option<bool> {
        self.get(codes::SUCCESS).and_then(Value::as_bool)
    }

    /// Non-null `response`
    pub fn response(&self) -> Option<&Value> {
        self.get(codes::RESPONSE)
    }

    /// Non-null `data`
    pub fn data(&self) -> Option<&Value> {
        self.get(codes::DATA)
    }

    /// `type`
    pub fn kind(&self) -> Option<&str> {
        self.get(codes::TYPE).and_then(Value::as_str)
    }

    /// The success predicate: `status == "success"`, `success == true` or
    /// `status == "1"`
    pub fn is_success(&self) -> bool {
        let status = self.status();
        status.as_deref() == Some(codes::API_SUCCESS_STATUS)
            || self.success() == Some(true)
            || status.as_deref() == Some(codes::API_SUCCESS_STATUS_NUMERIC)
    }

    /// Payload of a successful envelope: `response`, else `data`
    pub fn payload(&self) -> Option<&Value> {
        self.response().or_else(|| self.data())
    }

    /// Message precedence: non-empty `message`, then a string `response`,
    /// then empty
    pub fn response_message(&self) -> String {
        if let Some(message) = self.get(codes::MESSAGE).and_then(primitive_text) {
            if !message.is_empty() {
                return message;
            }
        }
        match self.response() {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Error code precedence: integer `error`, then digit-only `code`, then
    /// `fallback`
    pub fn response_error_code(&self, fallback: &str) -> String {
        if let Some(code) = self.get(codes::ERROR).and_then(integer_code) {
            return code;
        }
        if let Some(Value::String(code)) = self.get(codes::CODE) {
            if let Some(digits) = digits_only(code) {
                return digits;
            }
        }
        fallback.to_string()
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert back into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Envelope> for Value {
    fn from(envelope: Envelope) -> Self {
        envelope.into_value()
    }
}

/// Render a primitive as text; objects and arrays yield `None`
fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer_code(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                // 1003.0 still names error 1003
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| (f as i64).to_string())
            }
        }
        Value::String(s) => digits_only(s),
        _ => None,
    }
}

/// Integer value of a non-empty, digit-only string
fn digits_only(text: &str) -> Option<String> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<u64>().ok().map(|n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Envelope {
        Envelope::from_value(value).unwrap()
    }

    #[test]
    fn test_success_predicate_variants() {
        assert!(envelope(json!({"status": "success"})).is_success());
        assert!(envelope(json!({"success": true})).is_success());
        assert!(envelope(json!({"status": "1"})).is_success());
        assert!(envelope(json!({"status": 1})).is_success());
        assert!(!envelope(json!({"status": "fail"})).is_success());
        assert!(!envelope(json!({"success": "true"})).is_success());
        assert!(!envelope(json!({})).is_success());
    }

    #[test]
    fn test_null_keys_are_absent() {
        let env = envelope(json!({"response": null, "data": {"id": 7}}));
        assert!(env.response().is_none());
        assert_eq!(env.payload(), Some(&json!({"id": 7})));
    }

    #[test]
    fn test_kind_reads_type_key() {
        assert_eq!(envelope(json!({"type": "auth"})).kind(), Some("auth"));
        assert_eq!(envelope(json!({"type": 3})).kind(), None);
        assert_eq!(envelope(json!({})).kind(), None);
    }

    #[test]
    fn test_message_precedence() {
        let env = envelope(json!({"message": "Saved", "response": "ignored"}));
        assert_eq!(env.response_message(), "Saved");

        let env = envelope(json!({"message": "", "response": "From response"}));
        assert_eq!(env.response_message(), "From response");

        let env = envelope(json!({"response": {"id": 1}}));
        assert_eq!(env.response_message(), "");
    }

    #[test]
    fn test_error_code_precedence() {
        let env = envelope(json!({"error": 1003, "code": "42"}));
        assert_eq!(env.response_error_code("1000"), "1003");

        let env = envelope(json!({"code": "0042"}));
        assert_eq!(env.response_error_code("1000"), "42");

        let env = envelope(json!({"code": "E42"}));
        assert_eq!(env.response_error_code("1000"), "1000");

        let env = envelope(json!({"error": "oops"}));
        assert_eq!(env.response_error_code("500"), "500");

        let env = envelope(json!({"error": 1003.0}));
        assert_eq!(env.response_error_code("1000"), "1003");
    }

    #[test]
    fn test_from_slice_rejects_non_objects() {
        assert!(Envelope::from_slice(br#"{"status":"success"}"#).is_ok());
        assert!(matches!(
            Envelope::from_slice(b"[1,2]"),
            Err(Fault::MalformedPayload(_))
        ));
        assert!(matches!(
            Envelope::from_slice(b""),
            Err(Fault::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_parse_is_lenient() {
        assert!(Envelope::parse("not json").is_none());
        assert!(Envelope::parse("\"text\"").is_none());
        assert!(Envelope::parse("{}").is_some());
    }
}
