// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cache-specific error types.

use thiserror::Error;

/// Errors that can occur while fetching or caching a resource.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Configuration error (missing or invalid environment variable)
    #[error("configuration error: {0}")]
    Config(String),

    /// Request could not reach the API (DNS, connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(String),

    /// API returned a non-2xx response
    #[error("server error: {status} - {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// Response body could not be decoded as JSON
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CacheError::Decode(err.to_string())
        } else {
            CacheError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Decode(err.to_string())
    }
}

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;
