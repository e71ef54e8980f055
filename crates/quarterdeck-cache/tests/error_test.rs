// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error type tests for quarterdeck-cache.

use quarterdeck_cache::{transform_error_response, CacheError};

#[test]
fn test_config_error_display() {
    let err = CacheError::Config("QUARTERDECK_API_BASE_URL is required".to_string());
    assert!(err.to_string().contains("configuration error"));
    assert!(err.to_string().contains("QUARTERDECK_API_BASE_URL"));
}

#[test]
fn test_network_error_display() {
    let err = CacheError::Network("connection refused".to_string());
    assert!(err.to_string().contains("network error"));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_status_error_display() {
    let err = CacheError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    };
    let display = err.to_string();
    assert!(display.contains("server error"));
    assert!(display.contains("503"));
    assert!(display.contains("service unavailable"));
}

#[test]
fn test_decode_error_display() {
    let err = CacheError::Decode("expected value at line 1".to_string());
    assert!(err.to_string().contains("decode error"));
}

#[test]
fn test_serde_error_converts_to_decode() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: CacheError = parse_err.into();
    assert!(matches!(err, CacheError::Decode(_)));
}

#[test]
fn test_transform_error_response_prefers_message_field() {
    let err = transform_error_response(409, r#"{"message": "job run already exists"}"#);
    match err {
        CacheError::Status { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "job run already exists");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
