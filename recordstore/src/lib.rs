// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! RecordStore - pluggable storage backends for a record-oriented service
//!
//! A record service addresses heterogeneous datastores through one uniform
//! contract. Each backend chooses its own mapping of a generic [`Record`] onto
//! native storage and its own interpretation of a [`SearchQuery`].
//!
//! # Backends
//!
//! | Backend | Feature | Namespace | Table | Search |
//! |---------|---------|-----------|-------|--------|
//! | Elasticsearch | `elasticsearch` | index prefix | index suffix | `query_string` |
//! | Redis | `redis` | - | hashed logical database | creation-time index scan |
//! | Memory | always | in-process map | in-process map | table scan |
//!
//! # Usage
//!
//! ```ignore
//! use recordstore::{create_driver, DatabaseInfo, DriverKind, Node, Record, StoreConfig};
//!
//! let config = StoreConfig::from_file("recordstore.json")?.with_env_overrides();
//! let driver = create_driver(DriverKind::Elasticsearch, &config)?;
//!
//! let db = driver.new_db(&[Node::new("localhost", 9200)])?;
//! db.init(&DatabaseInfo::new("blog", "posts"))?;
//!
//! let mut post = Record::new("1").with_field("title", "hello");
//! db.create(&mut post)?;
//! assert!(post.created > 0);
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod model;

pub use config::{ElasticsearchConfig, RedisConfig, StoreConfig};
pub use driver::{create_driver, Database, Driver, DriverKind, DriverRegistry};
pub use error::{DbError, DbResult};
pub use model::{DatabaseInfo, Node, Record, SearchQuery, DEFAULT_SEARCH_LIMIT};

/// RecordStore version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
