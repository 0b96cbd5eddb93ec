// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver configuration
//!
//! Configuration is handed to the factory/registry once at startup. Every
//! field has a default, so an empty JSON object is a valid configuration.

use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Shared credential for the key-value backend
pub const ENV_REDIS_PASSWORD: &str = "RECORDSTORE_REDIS_PASSWORD";
pub const ENV_ES_USERNAME: &str = "RECORDSTORE_ES_USERNAME";
pub const ENV_ES_PASSWORD: &str = "RECORDSTORE_ES_PASSWORD";

/// Top-level configuration for all drivers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub elasticsearch: ElasticsearchConfig,
    pub redis: RedisConfig,
}

/// Document-store backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticsearchConfig {
    /// `http` or `https`
    pub scheme: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upper bound on every HTTP request
    pub request_timeout_ms: u64,
    /// Make writes visible to search before returning
    pub refresh_on_write: bool,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            username: None,
            password: None,
            request_timeout_ms: 30_000,
            refresh_on_write: false,
        }
    }
}

impl ElasticsearchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Key-value backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub password: Option<String>,
    /// Number of logical databases tables are hashed onto
    pub slot_count: u32,
    pub connect_timeout_ms: u64,
    /// Read/write timeout on established connections; none when unset
    pub io_timeout_ms: Option<u64>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            password: None,
            slot_count: 16,
            connect_timeout_ms: 5_000,
            io_timeout_ms: None,
        }
    }
}

impl RedisConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }
}

impl StoreConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> DbResult<Self> {
        serde_json::from_str(json).map_err(|e| DbError::Config(format!("Invalid config: {}", e)))
    }

    /// Load a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DbError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&contents)?;
        log::debug!("Loaded store configuration from {}", path.display());
        Ok(config)
    }

    /// Overlay credentials from the process environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(password) = std::env::var(ENV_REDIS_PASSWORD) {
            self.redis.password = Some(password);
        }
        if let Ok(username) = std::env::var(ENV_ES_USERNAME) {
            self.elasticsearch.username = Some(username);
        }
        if let Ok(password) = std::env::var(ENV_ES_PASSWORD) {
            self.elasticsearch.password = Some(password);
        }
        self
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.redis.slot_count == 0 {
            return Err(DbError::Config("redis.slot_count must be at least 1".into()));
        }
        if self.elasticsearch.request_timeout_ms == 0 {
            return Err(DbError::Config(
                "elasticsearch.request_timeout_ms must be positive".into(),
            ));
        }
        match self.elasticsearch.scheme.as_str() {
            "http" | "https" => Ok(()),
            other => Err(DbError::Config(format!(
                "Unknown elasticsearch.scheme: {}. Valid options: http, https",
                other
            ))),
        }
    }
}
