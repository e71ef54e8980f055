// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP transport behind the data cache.
//!
//! The engine only ever issues abortable GETs, so the transport seam is a
//! single-method trait. The production implementation wraps `reqwest` and
//! keeps a short-lived response cache keyed by URL plus auth context, which
//! deduplicates bursts of identical requests from unrelated page code.
//! Scheduler-driven polls bypass that cache so a poll always observes the
//! backend.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Abortable GET against the Code Engine API.
///
/// Cancellation is structural: the engine drops the future returned by
/// [`Transport::get`] to abort the request, so implementations must be
/// cancel-safe up to the point the response is returned.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET for the given request path.
    ///
    /// `bypass_cache` skips any short-lived response cache the implementation
    /// maintains; the result still refreshes that cache.
    async fn get(&self, url: &str, bypass_cache: bool) -> Result<Value>;
}

/// Normalize a non-2xx response into a [`CacheError`].
///
/// Code Engine error bodies carry a `message` field (older endpoints use
/// `error`); fall back to the raw body when neither parses.
pub fn transform_error_response(status: u16, body: &str) -> CacheError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|parsed| {
            parsed
                .get("message")
                .or_else(|| parsed.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());
    CacheError::Status { status, message }
}

struct CachedResponse {
    fetched_at: Instant,
    value: Value,
}

/// `reqwest`-backed [`Transport`] with auth headers and response dedup.
pub struct HttpTransport {
    client: reqwest::Client,
    config: CacheConfig,
    recent: Mutex<HashMap<String, CachedResponse>>,
}

impl HttpTransport {
    /// Build a transport from the given configuration.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| CacheError::Config(err.to_string()))?;
        Ok(Self {
            client,
            config,
            recent: Mutex::new(HashMap::new()),
        })
    }

    fn ttl(&self) -> Duration {
        Duration::from_millis(self.config.response_cache_ttl_ms)
    }

    /// Response cache key: URL plus the auth context, so sessions for
    /// different accounts sharing a process never see each other's responses.
    fn cache_key(&self, url: &str) -> String {
        format!(
            "{url}|{}|{}",
            self.config.account_id.as_deref().unwrap_or(""),
            self.config.auth_token.as_deref().unwrap_or(""),
        )
    }

    fn recent_lookup(&self, key: &str) -> Option<Value> {
        let ttl = self.ttl();
        let recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent
            .get(key)
            .filter(|cached| cached.fetched_at.elapsed() < ttl)
            .map(|cached| cached.value.clone())
    }

    fn recent_store(&self, key: String, value: Value) {
        let ttl = self.ttl();
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent.retain(|_, cached| cached.fetched_at.elapsed() < ttl);
        recent.insert(
            key,
            CachedResponse {
                fetched_at: Instant::now(),
                value,
            },
        );
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, bypass_cache: bool) -> Result<Value> {
        let key = self.cache_key(url);
        if !bypass_cache && !self.ttl().is_zero() {
            if let Some(value) = self.recent_lookup(&key) {
                debug!(url, "serving GET from response cache");
                return Ok(value);
            }
        }

        let full_url = format!("{}{}", self.config.api_base_url.trim_end_matches('/'), url);
        let mut request = self.client.get(&full_url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(account_id) = &self.config.account_id {
            request = request.header("X-Account-Id", account_id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(transform_error_response(status.as_u16(), &body));
        }

        let value: Value = response.json().await?;
        if !self.ttl().is_zero() {
            self.recent_store(key, value.clone());
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transform_error_response_message_field() {
        let err = transform_error_response(404, r#"{"message": "project not found"}"#);
        match err {
            CacheError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "project not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_transform_error_response_error_field() {
        let err = transform_error_response(500, r#"{"error": "boom"}"#);
        assert!(err.to_string().contains("boom"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_transform_error_response_opaque_body() {
        let err = transform_error_response(502, "bad gateway\n");
        match err {
            CacheError::Status { message, .. } => assert_eq!(message, "bad gateway"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cache_key_includes_auth_context() {
        let a = HttpTransport::new(CacheConfig::localhost().with_account_id("acct-1"))
            .expect("transport");
        let b = HttpTransport::new(CacheConfig::localhost().with_account_id("acct-2"))
            .expect("transport");
        assert_ne!(a.cache_key("/v2/projects"), b.cache_key("/v2/projects"));
    }

    #[test]
    fn test_recent_store_and_lookup() {
        let transport = HttpTransport::new(CacheConfig::localhost()).expect("transport");
        let key = transport.cache_key("/v2/projects");
        assert!(transport.recent_lookup(&key).is_none());
        transport.recent_store(key.clone(), json!({"projects": []}));
        assert_eq!(transport.recent_lookup(&key), Some(json!({"projects": []})));
    }

    #[test]
    fn test_recent_lookup_respects_zero_ttl() {
        let transport =
            HttpTransport::new(CacheConfig::localhost().with_response_cache_ttl_ms(0))
                .expect("transport");
        let key = transport.cache_key("/v2/projects");
        transport.recent_store(key.clone(), json!(1));
        assert!(transport.recent_lookup(&key).is_none());
    }
}
