// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types shared by every driver and handle

use thiserror::Error;

/// Error type for driver, registry and handle operations
///
/// Backend failures are carried verbatim in [`DbError::Backend`]; nothing is
/// retried or translated locally. Callers decide whether to retry using
/// [`DbError::is_retryable`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    /// No usable endpoint, handle already closed, or backend compiled out
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// Operation on an unbound handle
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    #[error("Driver already registered: {0}")]
    DuplicateDriver(String),

    /// Anything the remote store reported
    #[error("Backend error: {message}")]
    Backend { message: String, retryable: bool },

    /// Record the backend cannot store or address as given
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Permanent backend failure
    pub fn backend(message: impl Into<String>) -> Self {
        DbError::Backend {
            message: message.into(),
            retryable: false,
        }
    }

    /// Transient backend failure (connectivity, timeouts, overload)
    pub fn transient(message: impl Into<String>) -> Self {
        DbError::Backend {
            message: message.into(),
            retryable: true,
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::Backend {
                retryable: true,
                ..
            }
        )
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::Config(err.to_string())
    }
}

#[cfg(feature = "elasticsearch")]
impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect() || err.is_request();
        DbError::Backend {
            message: err.to_string(),
            retryable,
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for DbError {
    fn from(err: redis::RedisError) -> Self {
        let retryable = err.is_io_error()
            || err.is_timeout()
            || err.is_connection_refusal()
            || err.is_connection_dropped();
        DbError::Backend {
            message: err.to_string(),
            retryable,
        }
    }
}

/// Result type for driver and handle operations
pub type DbResult<T> = Result<T, DbError>;
