//! Loading client parameters from files

use netkit_core::{Error, NetworkClient, NetworkParams};
use std::io::Write;
use std::time::Duration;
use tempfile::Builder;

#[test]
fn test_load_yaml_params() {
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "base_url: https://api.example.com/v1/\nconnect_timeout_secs: 5\ncache:\n  enabled: false\nfresh_max_age_secs: 30"
    )
    .unwrap();

    let params = NetworkParams::from_file(file.path()).unwrap();
    assert_eq!(params.base_url.as_deref(), Some("https://api.example.com/v1/"));
    assert_eq!(params.connect_timeout(), Duration::from_secs(5));
    assert!(!params.cache.enabled);
    assert_eq!(params.cache_policy().fresh_max_age, Duration::from_secs(30));
    assert_eq!(params.cache_policy().max_stale, Duration::from_secs(604800));
}

#[test]
fn test_load_json_params() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"read_timeout_secs": 60, "cache": {{"max_size_bytes": 1024}}}}"#).unwrap();

    let params = NetworkParams::from_file(file.path()).unwrap();
    assert_eq!(params.read_timeout_secs, 60);
    assert_eq!(params.cache.max_size_bytes, 1024);
    assert!(params.cache.enabled);
    assert_eq!(params.total_timeout(), Duration::from_secs(75));
}

#[test]
fn test_malformed_file_is_reported() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "base_url: not json").unwrap();
    assert!(matches!(
        NetworkParams::from_file(file.path()),
        Err(Error::Json { .. })
    ));

    let missing = std::path::Path::new("/definitely/not/here.yaml");
    assert!(matches!(NetworkParams::from_file(missing), Err(Error::Io { .. })));
}

#[test]
fn test_loaded_params_build_a_client() {
    let mut file = Builder::new().suffix(".yml").tempfile().unwrap();
    writeln!(file, "base_url: https://api.example.com/v1/").unwrap();

    let params = NetworkParams::from_file(file.path()).unwrap();
    let client = NetworkClient::builder().params(params).build().unwrap();
    assert_eq!(
        client.base_url().map(|u| u.as_str()),
        Some("https://api.example.com/v1/")
    );
}

#[test]
fn test_invalid_base_url_fails_build() {
    let params = NetworkParams::default().with_base_url("::not a url::");
    assert!(matches!(
        NetworkClient::builder().params(params).build(),
        Err(Error::InvalidUrl { .. })
    ));
}
