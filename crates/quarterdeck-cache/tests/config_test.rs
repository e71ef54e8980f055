// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration tests for quarterdeck-cache.

use quarterdeck_cache::{CacheConfig, CacheError};

#[test]
fn test_new_defaults() {
    let config = CacheConfig::new("https://api.codeengine.example.com");

    assert_eq!(config.api_base_url, "https://api.codeengine.example.com");
    assert!(config.auth_token.is_none());
    assert!(config.account_id.is_none());
    assert_eq!(config.request_timeout_ms, 30_000);
    assert_eq!(config.response_cache_ttl_ms, 2_000);
}

#[test]
fn test_localhost_defaults() {
    let config = CacheConfig::localhost();
    assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
}

#[test]
fn test_builder_chain() {
    let config = CacheConfig::new("https://api.example.com")
        .with_auth_token("bearer-token")
        .with_account_id("acct-123")
        .with_request_timeout_ms(10_000)
        .with_response_cache_ttl_ms(500);

    assert_eq!(config.auth_token.as_deref(), Some("bearer-token"));
    assert_eq!(config.account_id.as_deref(), Some("acct-123"));
    assert_eq!(config.request_timeout_ms, 10_000);
    assert_eq!(config.response_cache_ttl_ms, 500);
}

#[test]
fn test_from_env_requires_base_url() {
    // The test environment never exports QUARTERDECK_API_BASE_URL, so the
    // required-variable path is the one we can exercise hermetically.
    if std::env::var("QUARTERDECK_API_BASE_URL").is_ok() {
        return;
    }
    let err = CacheConfig::from_env().unwrap_err();
    assert!(matches!(err, CacheError::Config(_)));
    assert!(err.to_string().contains("QUARTERDECK_API_BASE_URL"));
}
