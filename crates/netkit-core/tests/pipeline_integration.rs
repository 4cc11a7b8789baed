//! End-to-end tests of the request pipeline over a mock transport
//!
//! Covers:
//! - Common parameter injection and capability opt-outs
//! - Blocking, offline routing and stale-cache opt-in
//! - Stage ordering and response hooks
//! - Gzip handling
//! - Envelope normalization and fault classification


use flate2::write::GzEncoder;
use flate2::Compression;
use netkit_core::codes;
use netkit_core::http::{Body, Capabilities, Method, Response};
use netkit_core::{ApiError, ApiResult, ErrorKind, Fault, ResponseListener};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use test_support::{client, MockTransport, RecordingInterceptor};

#[derive(Debug, Deserialize, PartialEq)]
struct Profile {
    id: u32,
    name: String,
}

fn profile_envelope() -> Value {
    json!({
        "status": "success",
        "message": "Profile loaded",
        "response": {"id": 7, "name": "Ada"}
    })
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

// ============================================================================
// AUGMENTATION
// ============================================================================

#[test]
fn test_common_parameters_reach_transport() {
    let transport = MockTransport::json(200, profile_envelope());
    let interceptor = RecordingInterceptor::new("app")
        .with_header("X-App-Version", "4.2")
        .with_query("lang", "en")
        .with_body_field("device", json!("android"));
    let client = client(&transport, &[interceptor]);

    let result: ApiResult<Profile> = client.post("profile", &json!({"id": 7}));
    assert_eq!(
        result,
        ApiResult::success(Profile { id: 7, name: "Ada".to_string() }, "Profile loaded")
    );

    let sent = transport.last_request();
    assert_eq!(sent.url_string(), "https://api.example.com/v1/profile?lang=en");
    assert_eq!(sent.header("x-app-version"), Some("4.2"));
    assert_eq!(sent.header(codes::CACHE_CONTROL), Some("public, max-age=5"));
    let body: Value = serde_json::from_slice(&sent.body().unwrap().bytes).unwrap();
    assert_eq!(body, json!({"id": 7, "device": "android"}));
}

#[test]
fn test_skip_body_keeps_bytes_identical() {
    let transport = MockTransport::json(200, json!({"status": "success"}));
    let interceptor = RecordingInterceptor::new("app")
        .with_header("X-App-Version", "4.2")
        .with_body_field("device", json!("android"));
    let client = client(&transport, &[interceptor]);

    let body = Body::json_text("{\"id\":7,  \"note\":\"keep my spacing\"}");
    let request = client
        .request(Method::Post, "notes")
        .unwrap()
        .with_body(body.clone())
        .with_capabilities(Capabilities::default().without_body());

    assert!(client.call_boolean(request).is_success());
    let sent = transport.last_request();
    assert_eq!(sent.body(), Some(&body));
    assert_eq!(sent.header("X-App-Version"), Some("4.2"));
}

#[test]
fn test_skip_all_sends_request_untouched() {
    let transport = MockTransport::json(200, json!({"status": "success"}));
    let interceptor = RecordingInterceptor::new("app")
        .with_header("X-App-Version", "4.2")
        .with_query("lang", "en");
    let client = client(&transport, &[interceptor]);

    let request = client
        .request(Method::Get, "ping")
        .unwrap()
        .with_capabilities(Capabilities::skipping_all());
    client.call_boolean(request);

    let sent = transport.last_request();
    assert_eq!(sent.url().query(), None);
    assert!(!sent.has_header("X-App-Version"));
}

#[test]
fn test_form_post_merges_common_fields() {
    let transport = MockTransport::json(200, json!({"success": true, "data": 1}));
    let interceptor = RecordingInterceptor::new("app").with_body_field("device", json!("android"));
    let client = client(&transport, &[interceptor]);

    let result: ApiResult<u32> = client.post_form("login", &[("user", "ada")]);
    assert_eq!(result, ApiResult::success(1, ""));
    assert_eq!(
        transport.last_request().body().unwrap().text(),
        "user=ada&device=android"
    );
}

// ============================================================================
// CONNECTIVITY
// ============================================================================

#[test]
fn test_blocked_request_never_dispatched() {
    let transport = MockTransport::json(200, profile_envelope());
    let interceptor = RecordingInterceptor::new("app").blocking();
    let client = client(&transport, &[interceptor.clone()]);

    let err = client.get::<Profile>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, codes::API_BLOCKED_CODE);
    assert_eq!(err.message, codes::REQUEST_BLOCKED);
    assert_eq!(err.kind, ErrorKind::BlockedRequest);
    assert_eq!(transport.request_count(), 0);

    let events = interceptor.events();
    assert_eq!(events[0], "app:request");
    assert!(events[1].starts_with("app:error:1010:"));
    assert_eq!(events.len(), 2);
}

#[test]
fn test_blocked_beats_offline_and_uses_template() {
    let transport = MockTransport::json(200, profile_envelope());
    let mut interceptor = RecordingInterceptor::new("app").blocking().offline();
    interceptor.block_template = Some(json!({
        "status": "fail",
        "message": "Please update the app",
        "error": 426
    }));
    let client = client(&transport, &[interceptor]);

    let err = client.get::<Profile>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, "426");
    assert_eq!(err.message, "Please update the app");
    assert_eq!(err.kind, ErrorKind::BlockedRequest);
}

#[test]
fn test_offline_get_with_opt_in_goes_to_cache() {
    let transport = MockTransport::json(200, profile_envelope());
    let interceptor = RecordingInterceptor::new("app").offline();
    let client = client(&transport, &[interceptor]);

    let request = client.request(Method::Get, "profile").unwrap().allow_stale_cache();
    assert!(client.call::<Profile>(request).is_success());
    assert_eq!(
        transport.last_request().header(codes::CACHE_CONTROL),
        Some("public, only-if-cached, max-stale=604800")
    );
}

#[test]
fn test_offline_without_opt_in_is_no_connectivity() {
    let transport = MockTransport::json(200, profile_envelope());
    let interceptor = RecordingInterceptor::new("app").offline();
    let client = client(&transport, &[interceptor.clone()]);

    let request = client
        .request(Method::Post, "profile")
        .unwrap()
        .allow_stale_cache();
    let err = client.call::<Profile>(request).into_result().unwrap_err();
    assert_eq!(err.code, codes::NO_INTERNET_CONNECTION_CODE);
    assert_eq!(err.message, codes::INTERNET_UNAVAILABLE);
    assert_eq!(err.kind, ErrorKind::NoConnectivity);
    assert_eq!(transport.request_count(), 0);
    // Offline is not a block: the error hook stays quiet
    assert_eq!(interceptor.events(), vec!["app:request"]);
}

#[test]
fn test_offline_head_with_opt_in_is_no_connectivity() {
    let transport = MockTransport::json(200, profile_envelope());
    let interceptor = RecordingInterceptor::new("app").offline();
    let client = client(&transport, &[interceptor]);

    let request = client.request(Method::Head, "feed").unwrap().allow_stale_cache();
    let err = client.call_boolean(request).into_result().unwrap_err();
    assert_eq!(err.code, codes::NO_INTERNET_CONNECTION_CODE);
    assert_eq!(err.kind, ErrorKind::NoConnectivity);
    assert_eq!(transport.request_count(), 0);
}

// ============================================================================
// CHAIN ORDERING AND HOOKS
// ============================================================================

#[test]
fn test_stages_nest_in_registration_order() {
    let transport = MockTransport::json(200, json!({"status": "success"}));
    let outer = RecordingInterceptor::new("outer").with_query("a", "1");
    let inner = RecordingInterceptor::new("inner").with_query("b", "2");
    let client = client(&transport, &[outer.clone(), inner.clone()]);

    assert!(client.call_boolean(client.request(Method::Get, "feed").unwrap()).is_success());

    assert_eq!(outer.events(), vec!["outer:request", "outer:time", "outer:success:200"]);
    assert_eq!(inner.events(), vec!["inner:request", "inner:time", "inner:success:200"]);
    // The inner stage sees the URL the outer stage produced
    assert_eq!(outer.seen_urls(), vec!["https://api.example.com/v1/feed"]);
    assert_eq!(inner.seen_urls(), vec!["https://api.example.com/v1/feed?a=1"]);
    assert_eq!(
        transport.last_request().url_string(),
        "https://api.example.com/v1/feed?a=1&b=2"
    );
}

#[test]
fn test_hooks_see_url_before_common_query() {
    let transport = MockTransport::json(200, json!({"status": "success"}));
    let interceptor = RecordingInterceptor::new("app").with_query("lang", "en");
    let client = client(&transport, &[interceptor.clone()]);

    assert!(client.call_boolean(client.request(Method::Get, "feed").unwrap()).is_success());

    assert_eq!(
        transport.last_request().url_string(),
        "https://api.example.com/v1/feed?lang=en"
    );
    // allow predicate, response time, success
    assert_eq!(interceptor.hook_urls(), vec!["https://api.example.com/v1/feed"; 3]);
}

#[test]
fn test_response_time_measures_dispatch() {
    let delay = Duration::from_millis(50);
    let transport = MockTransport::json(200, json!({"status": "success"})).with_delay(delay);
    let interceptor = RecordingInterceptor::new("app");
    let client = client(&transport, &[interceptor.clone()]);

    assert!(client.call_boolean(client.request(Method::Get, "slow").unwrap()).is_success());

    let timings = interceptor.timings();
    assert_eq!(timings.len(), 1);
    assert!(timings[0] >= delay, "elapsed {:?} shorter than {:?}", timings[0], delay);
}

#[test]
fn test_http_error_status_extracts_envelope() {
    let transport = MockTransport::json(
        401,
        json!({"status": "fail", "message": "Invalid token", "error": 1003}),
    );
    let interceptor = RecordingInterceptor::new("app");
    let client = client(&transport, &[interceptor.clone()]);

    let err = client.get::<Profile>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, "1003");
    assert_eq!(err.message, "Invalid token");
    assert_eq!(err.kind, ErrorKind::HttpError(401));
    assert!(err.raw_envelope.is_some());
    assert!(interceptor.events()[2].starts_with("app:error:401:"));
}

#[test]
fn test_http_error_without_envelope_uses_status() {
    let transport = MockTransport::responding(503, "Service Unavailable");
    let client = client(&transport, &[]);

    let err = client.get::<Value>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, "503");
    assert_eq!(err.message, "Service Unavailable");
}

// ============================================================================
// GZIP
// ============================================================================

#[test]
fn test_gzip_body_is_decoded() {
    let body = gzip(profile_envelope().to_string().as_bytes());
    let transport = MockTransport::new(move |_| {
        Ok(Response::new(200, body.clone()).with_header("Content-Encoding", "gzip"))
    });
    let client = client(&transport, &[RecordingInterceptor::new("app")]);

    let result = client.get::<Profile>("profile", &[]);
    assert_eq!(result.payload().unwrap().name, "Ada");
}

#[test]
fn test_gzip_body_is_decoded_without_interceptors() {
    let body = gzip(profile_envelope().to_string().as_bytes());
    let transport = MockTransport::new(move |_| {
        Ok(Response::new(200, body.clone()).with_header("Content-Encoding", "gzip"))
    });
    let client = client(&transport, &[]);

    assert!(client.get::<Profile>("profile", &[]).is_success());
}

#[test]
fn test_corrupt_gzip_degrades_to_empty_body() {
    let transport = MockTransport::new(|_| {
        Ok(Response::new(200, "not gzip at all").with_header("Content-Encoding", "gzip"))
    });
    let client = client(&transport, &[RecordingInterceptor::new("app")]);

    let err = client.get::<Profile>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, codes::UNKNOWN_ERROR_CODE);
    assert_eq!(err.message, codes::UNKNOWN_ERROR_MESSAGE);
}

// ============================================================================
// FAULTS
// ============================================================================

#[test]
fn test_transport_timeout() {
    let transport = MockTransport::failing(Fault::Timeout);
    let client = client(&transport, &[RecordingInterceptor::new("app")]);

    let err = client.get::<Profile>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, codes::TIMEOUT_ERROR_CODE);
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.cause, Some(Fault::Timeout));
}

#[test]
fn test_unknown_transport_fault() {
    let transport = MockTransport::failing(Fault::unknown_message("connection reset by peer"));
    let client = client(&transport, &[]);

    let err = client.call_boolean(client.request(Method::Get, "ping").unwrap());
    let err = err.into_result().unwrap_err();
    assert_eq!(err.code, codes::UNKNOWN_ERROR_CODE);
    assert_eq!(err.kind, ErrorKind::UnknownFault);
}

#[test]
fn test_queued_responses_are_served_first() {
    let transport = MockTransport::json(200, json!({"status": "success"}))
        .then(Err(Fault::Timeout));
    let client = client(&transport, &[]);

    let first = client.call_boolean(client.request(Method::Get, "ping").unwrap());
    let second = client.call_boolean(client.request(Method::Get, "ping").unwrap());
    assert_eq!(first.error().unwrap().code, codes::TIMEOUT_ERROR_CODE);
    assert!(second.is_success());
    assert_eq!(transport.request_count(), 2);
}

// ============================================================================
// NORMALIZATION
// ============================================================================

#[test]
fn test_success_without_payload_is_error() {
    let transport = MockTransport::json(200, json!({"status": "success", "message": "Saved"}));
    let client = client(&transport, &[]);

    let err = client.get::<Profile>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, codes::UNKNOWN_ERROR_CODE);
    assert_eq!(err.message, "Saved");
    assert_eq!(err.kind, ErrorKind::EnvelopeError);

    // The boolean variant only checks the predicate
    let ok = client.call_boolean(client.request(Method::Get, "profile").unwrap());
    assert_eq!(ok, ApiResult::success(true, "Saved"));
}

#[test]
fn test_payload_type_mismatch() {
    let transport = MockTransport::json(200, json!({"status": "1", "data": [1, 2]}));
    let client = client(&transport, &[]);

    let err = client.get::<Profile>("profile", &[]).into_result().unwrap_err();
    assert_eq!(err.code, codes::JSON_EXCEPTION_ERROR_CODE);
    assert_eq!(err.kind, ErrorKind::MalformedPayload);
}

#[derive(Default)]
struct Collector {
    seen: Mutex<Vec<String>>,
}

impl ResponseListener<Profile> for Collector {
    fn on_success(&self, payload: Profile, message: String) {
        self.seen.lock().unwrap().push(format!("{}|{}", payload.name, message));
    }

    fn on_error(&self, error: ApiError) {
        self.seen.lock().unwrap().push(error.to_string());
    }
}

#[test]
fn test_results_dispatch_to_listener() {
    let listener = Collector::default();

    let ok = client(&MockTransport::json(200, profile_envelope()), &[]);
    ok.get::<Profile>("profile", &[]).dispatch(&listener);

    let failing = client(&MockTransport::failing(Fault::Timeout), &[]);
    failing.get::<Profile>("profile", &[]).dispatch(&listener);

    assert_eq!(
        *listener.seen.lock().unwrap(),
        vec!["Ada|Profile loaded", "[9002] Something went wrong"]
    );
}
