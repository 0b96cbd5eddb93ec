// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Generic entities exchanged with every backend
//!
//! A [`Record`] is persisted verbatim as a JSON document:
//!
//! ```text
//! { "id": "1", "created": 1700000000, "updated": 1700000000, <payload fields...> }
//! ```

use crate::error::DbError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Top-level document keys owned by [`Record`] itself
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created", "updated"];

/// Page size applied when a search asks for `limit <= 0`
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// A generic record stored under its id within one namespace+table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,

    /// Unix seconds of the first write; never overwritten once non-zero
    #[serde(default)]
    pub created: i64,

    /// Unix seconds of the latest write
    #[serde(default)]
    pub updated: i64,

    /// Opaque payload, flattened into the persisted document
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a payload field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Reject payload keys that would shadow `id`, `created` or `updated`
    /// in the flattened document
    pub fn validate(&self) -> Result<(), DbError> {
        match RESERVED_FIELDS.iter().find(|key| self.data.contains_key(**key)) {
            Some(key) => Err(DbError::InvalidRecord(format!(
                "record '{}' carries reserved payload field '{}'",
                self.id, key
            ))),
            None => Ok(()),
        }
    }

    /// Apply the write timestamp policy
    pub fn stamp(&mut self, now: i64) {
        if self.created == 0 {
            self.created = now;
        }
        self.updated = now;
    }

    /// Textual form of a top-level field, used for term matching
    pub fn field_text(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "created" => Some(self.created.to_string()),
            "updated" => Some(self.updated.to_string()),
            _ => self.data.get(name).map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// Namespace + table pair a handle is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub table: String,
}

impl DatabaseInfo {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DbError> {
        if self.name.is_empty() || self.table.is_empty() {
            return Err(DbError::NotAvailable(format!(
                "database name and table must be non-empty (got '{}'/'{}')",
                self.name, self.table
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DatabaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.table)
    }
}

/// Storage endpoint resolved by service discovery
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub address: String,
    pub port: u16,
}

impl Node {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl FromStr for Node {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, port) = s
            .rsplit_once(':')
            .ok_or_else(|| DbError::Config(format!("Invalid node '{}': expected host:port", s)))?;
        if address.is_empty() {
            return Err(DbError::Config(format!("Invalid node '{}': empty host", s)));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| DbError::Config(format!("Invalid node '{}': {}", s, e)))?;
        Ok(Node::new(address, port))
    }
}

/// Flat key/value search with offset/limit paging
///
/// Terms are conjunctive; each one matches a field against its term as a
/// substring. An empty term map matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub terms: BTreeMap<String, String>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Newest first when set
    #[serde(default)]
    pub reverse: bool,
}

impl SearchQuery {
    /// Match-all query with default paging
    pub fn all() -> Self {
        Self::default()
    }

    pub fn term(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.insert(field.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Normalized `(offset, limit)`
    pub fn page(&self) -> (usize, usize) {
        let limit = if self.limit <= 0 {
            DEFAULT_SEARCH_LIMIT
        } else {
            usize::try_from(self.limit).unwrap_or(usize::MAX)
        };
        let offset = usize::try_from(self.offset.max(0)).unwrap_or(usize::MAX);
        (offset, limit)
    }

    /// Case-insensitive substring match of every term against the record
    pub fn matches(&self, record: &Record) -> bool {
        self.terms.iter().all(|(field, term)| {
            record
                .field_text(field)
                .map(|text| text.to_lowercase().contains(&term.to_lowercase()))
                .unwrap_or(false)
        })
    }
}
