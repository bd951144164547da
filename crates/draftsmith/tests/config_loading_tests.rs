//! Table-driven tests for configuration loading and validation.

mod common;

use draftsmith::config::{load_config, load_config_from_str};

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0", "storage_directory": "/srv/draftsmith" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "storage_directory": "/srv/draftsmith",
            "database_path": "/srv/draftsmith/db.sqlite",
            "worker_count": 4,
            "queue_capacity": 32,
            "generation": {
                "model": "gemini-1.5-flash",
                "base_url": "https://generativelanguage.googleapis.com",
                "api_key_file": "/run/secrets/gemini",
                "request_timeout_secs": 60,
                "min_call_interval_ms": 250
            },
            "converter": {
                "libreoffice_path": "/usr/bin/soffice",
                "target_format": "pdf",
                "timeout_secs": 90
            },
            "logging": { "level": "draftsmith=debug", "json": true }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "missing_storage_directory",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: false,
        expected_error: Some("storage_directory"),
    },
    ConfigTestCase {
        name: "unknown_version",
        config_json: r#"{ "version": "2.0", "storage_directory": "/srv" }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "unknown_field",
        config_json: r#"{ "version": "1.0", "storage_directory": "/srv", "watch": true }"#,
        should_succeed: false,
        expected_error: Some("watch"),
    },
    ConfigTestCase {
        name: "zero_workers",
        config_json: r#"{ "version": "1.0", "storage_directory": "/srv", "worker_count": 0 }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "no_credential_source",
        config_json: r#"{
            "version": "1.0",
            "storage_directory": "/srv",
            "generation": { "api_key_env_var": null }
        }"#,
        should_succeed: false,
        expected_error: Some("api_key"),
    },
    ConfigTestCase {
        name: "docx_target_format",
        config_json: r#"{
            "version": "1.0",
            "storage_directory": "/srv",
            "converter": { "target_format": "docx" }
        }"#,
        should_succeed: false,
        expected_error: Some("target_format"),
    },
    ConfigTestCase {
        name: "plain_http_base_url_allowed",
        config_json: r#"{
            "version": "1.0",
            "storage_directory": "/srv",
            "generation": { "base_url": "http://localhost:8080" }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "base_url_without_scheme",
        config_json: r#"{
            "version": "1.0",
            "storage_directory": "/srv",
            "generation": { "base_url": "localhost:8080" }
        }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "not_json",
        config_json: "version = 1.0",
        should_succeed: false,
        expected_error: Some("parse config JSON"),
    },
];

#[test]
fn test_config_loading() {
    for case in CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected failure", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    assert!(
                        message.contains(expected),
                        "{}: '{}' does not contain '{}'",
                        case.name,
                        message,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_load_from_file() {
    let harness = common::TestHarness::new();
    let path = harness.write_file(
        "config.json",
        br#"{ "version": "1.0", "storage_directory": "~/draftsmith", "worker_count": 2 }"#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(config.worker_count, 2);
    assert!(!config.storage_path().to_string_lossy().starts_with('~'));
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/draftsmith/config.json").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
