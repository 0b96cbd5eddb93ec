// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver factory
//!
//! Config-time selection of a backend: maps a [`DriverKind`] to its driver
//! implementation without any runtime registry.

use super::memory::MemoryDriver;
use super::traits::Driver;
use super::types::DriverKind;
use crate::config::StoreConfig;
use crate::error::{DbError, DbResult};
use std::sync::Arc;

/// Create the driver for `kind`
///
/// # Arguments
/// * `kind` - Backend to talk to
/// * `config` - Settings for every backend; only the matching section is used
///
/// # Returns
/// * `Err(DbError::Config)` if the configuration is invalid
/// * `Err(DbError::NotAvailable)` if the backend was compiled out
///
/// # Examples
/// ```ignore
/// let driver = create_driver(DriverKind::Redis, &StoreConfig::default())?;
/// let db = driver.new_db(&[Node::new("localhost", 6379)])?;
/// db.init(&DatabaseInfo::new("blog", "posts"))?;
/// ```
pub fn create_driver(kind: DriverKind, config: &StoreConfig) -> DbResult<Arc<dyn Driver>> {
    config.validate()?;

    match kind {
        #[cfg(feature = "elasticsearch")]
        DriverKind::Elasticsearch => {
            use super::elasticsearch::ElasticsearchDriver;
            Ok(Arc::new(ElasticsearchDriver::new(
                config.elasticsearch.clone(),
            )))
        }
        #[cfg(feature = "redis")]
        DriverKind::Redis => {
            use super::redis::RedisDriver;
            Ok(Arc::new(RedisDriver::new(config.redis.clone())))
        }
        DriverKind::Memory => Ok(Arc::new(MemoryDriver::new())),
        #[allow(unreachable_patterns)]
        other => Err(DbError::NotAvailable(format!(
            "{} driver was not compiled into this build",
            other
        ))),
    }
}
