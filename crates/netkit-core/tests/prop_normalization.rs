//! Property-based tests for envelope normalization
//!
//! These tests verify invariants that hold for every envelope shape the
//! normalizer may encounter.

use netkit_core::codes;
use netkit_core::normalizer::error_from_body;
use netkit_core::{classify, normalize, normalize_boolean, Envelope, ErrorKind, Fault};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for primitive JSON values
fn primitive_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::from(n)),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        Just(Value::String("success".to_string())),
        Just(Value::String("1".to_string())),
        Just(Value::String("fail".to_string())),
    ]
}

/// Strategy for envelopes mixing the recognized keys
fn envelope_strategy() -> impl Strategy<Value = Envelope> {
    proptest::collection::vec(
        (
            prop_oneof![
                Just("status"),
                Just("success"),
                Just("response"),
                Just("data"),
                Just("message"),
                Just("error"),
                Just("code"),
                Just("type"),
            ],
            primitive_strategy(),
        ),
        0..8,
    )
    .prop_map(|entries| {
        let map: Map<String, Value> = entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Envelope::from_map(map)
    })
}

proptest! {
    #[test]
    fn prop_normalize_is_deterministic(envelope in envelope_strategy()) {
        prop_assert_eq!(normalize::<Value>(&envelope), normalize::<Value>(&envelope));
        prop_assert_eq!(normalize_boolean(&envelope), normalize_boolean(&envelope));
    }

    #[test]
    fn prop_errors_are_always_populated(envelope in envelope_strategy()) {
        if let Some(err) = normalize::<Value>(&envelope).error() {
            prop_assert!(!err.code.is_empty());
            prop_assert!(!err.message.is_empty());
            prop_assert!(err.code.chars().all(|c| c.is_ascii_digit() || c == '-'));
        }
    }

    #[test]
    fn prop_success_requires_predicate_and_payload(envelope in envelope_strategy()) {
        let result = normalize::<Value>(&envelope);
        prop_assert_eq!(
            result.is_success(),
            envelope.is_success() && envelope.payload().is_some()
        );
        prop_assert_eq!(normalize_boolean(&envelope).is_success(), envelope.is_success());
    }

    #[test]
    fn prop_integer_error_code_wins(code in 0u32..100_000, other in "[0-9]{1,5}") {
        let envelope = Envelope::parse(&format!(
            r#"{{"status":"fail","error":{},"code":"{}"}}"#,
            code, other
        ))
        .unwrap();
        let err = normalize::<Value>(&envelope).into_result().unwrap_err();
        prop_assert_eq!(err.code, code.to_string());
    }

    #[test]
    fn prop_status_faults_fall_back_to_status(status in 300u16..600, text in "[a-zA-Z ]{0,20}") {
        let err = classify(Fault::HttpStatus { status, body: Some(text.clone()) });
        prop_assert_eq!(err.code, status.to_string());
        prop_assert_eq!(err.kind, ErrorKind::HttpError(status));
        if text.trim().is_empty() {
            prop_assert_eq!(err.message, codes::UNKNOWN_ERROR_MESSAGE);
        } else {
            prop_assert_eq!(err.message, text);
        }
    }

    #[test]
    fn prop_error_from_body_never_panics(body in ".{0,64}") {
        let err = error_from_body(&body, "1000", ErrorKind::EnvelopeError);
        prop_assert!(!err.code.is_empty());
        prop_assert!(!err.message.is_empty());
    }
}
