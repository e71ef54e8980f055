// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the HTTP transport behind the data cache.

use std::env;

use crate::error::{CacheError, Result};

/// Configuration for connecting to the Code Engine API.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Base URL of the Code Engine API (required), e.g. "https://api.codeengine.example.com"
    pub api_base_url: String,
    /// Bearer token attached to every request (default: none)
    pub auth_token: Option<String>,
    /// Account ID attached as `X-Account-Id` (default: none).
    /// Part of the auth context, so it participates in the response cache key.
    pub account_id: Option<String>,
    /// Request timeout in milliseconds (default: 30_000)
    pub request_timeout_ms: u64,
    /// How long a GET response may be served from the short-lived response
    /// cache, in milliseconds (default: 2_000). Set to 0 to disable.
    /// Scheduler-driven polls always bypass this cache.
    pub response_cache_ttl_ms: u64,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    ///
    /// # Required Environment Variables
    /// - `QUARTERDECK_API_BASE_URL` - Base URL of the Code Engine API
    ///
    /// # Optional Environment Variables
    /// - `QUARTERDECK_AUTH_TOKEN` - Bearer token (default: none)
    /// - `QUARTERDECK_ACCOUNT_ID` - Account ID header (default: none)
    /// - `QUARTERDECK_REQUEST_TIMEOUT_MS` - Request timeout (default: 30000)
    /// - `QUARTERDECK_RESPONSE_CACHE_TTL_MS` - Response cache TTL (default: 2000, 0 to disable)
    pub fn from_env() -> Result<Self> {
        let api_base_url = env::var("QUARTERDECK_API_BASE_URL")
            .map_err(|_| CacheError::Config("QUARTERDECK_API_BASE_URL is required".to_string()))?;

        let auth_token = env::var("QUARTERDECK_AUTH_TOKEN").ok();
        let account_id = env::var("QUARTERDECK_ACCOUNT_ID").ok();

        let request_timeout_ms = env::var("QUARTERDECK_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30_000);

        let response_cache_ttl_ms = env::var("QUARTERDECK_RESPONSE_CACHE_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2_000);

        Ok(Self {
            api_base_url,
            auth_token,
            account_id,
            request_timeout_ms,
            response_cache_ttl_ms,
        })
    }

    /// Create a new configuration pointing at the given API base URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            auth_token: None,
            account_id: None,
            request_timeout_ms: 30_000,
            response_cache_ttl_ms: 2_000,
        }
    }

    /// Create a configuration for local development against a dev API on port 8080.
    pub fn localhost() -> Self {
        Self::new("http://127.0.0.1:8080")
    }

    /// Set the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the account ID header.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Set the response cache TTL. Set to 0 to disable response caching.
    pub fn with_response_cache_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.response_cache_ttl_ms = ttl_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = CacheConfig::new("https://api.example.com");
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert!(config.auth_token.is_none());
        assert!(config.account_id.is_none());
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.response_cache_ttl_ms, 2_000);
    }

    #[test]
    fn test_localhost_config() {
        let config = CacheConfig::localhost();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_builder_chain() {
        let config = CacheConfig::new("https://api.example.com")
            .with_auth_token("tok-123")
            .with_account_id("acct-9")
            .with_request_timeout_ms(5_000)
            .with_response_cache_ttl_ms(0);

        assert_eq!(config.auth_token.as_deref(), Some("tok-123"));
        assert_eq!(config.account_id.as_deref(), Some("acct-9"));
        assert_eq!(config.request_timeout_ms, 5_000);
        assert_eq!(config.response_cache_ttl_ms, 0);
    }
}
