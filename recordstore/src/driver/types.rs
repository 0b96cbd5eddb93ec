// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver kinds

use crate::error::DbError;
use serde::{Deserialize, Serialize};

/// Backend a driver talks to
///
/// Each kind maps a record onto different native primitives:
/// documents in an index, or values in a key-value namespace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Elasticsearch - index per namespace+table, `_doc` documents
    /// Native full-text search
    Elasticsearch,

    /// Redis - logical database slot per table, record JSON under its id
    /// Search via a creation-time secondary index
    Redis,

    /// Memory - in-process store
    /// Best for: Unit testing, development
    Memory,
}

impl DriverKind {
    /// Every kind, in registration order
    pub const ALL: [DriverKind; 3] = [
        DriverKind::Elasticsearch,
        DriverKind::Redis,
        DriverKind::Memory,
    ];

    /// Registry name
    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Elasticsearch => "elasticsearch",
            DriverKind::Redis => "redis",
            DriverKind::Memory => "memory",
        }
    }

    /// Whether the backend was compiled into this build
    pub fn is_enabled(&self) -> bool {
        match self {
            DriverKind::Elasticsearch => cfg!(feature = "elasticsearch"),
            DriverKind::Redis => cfg!(feature = "redis"),
            DriverKind::Memory => true,
        }
    }
}

impl std::str::FromStr for DriverKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elasticsearch" => Ok(DriverKind::Elasticsearch),
            "redis" => Ok(DriverKind::Redis),
            "memory" => Ok(DriverKind::Memory),
            _ => Err(DbError::DriverNotFound(format!(
                "Unknown driver: {}. Valid options: elasticsearch, redis, memory",
                s
            ))),
        }
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
