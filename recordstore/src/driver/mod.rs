// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage drivers
//!
//! This module provides trait-based abstractions over record storage, allowing
//! different backends (Elasticsearch, Redis, memory) to be addressed through
//! one contract.
//!
//! # Architecture
//!
//! ```text
//! DriverRegistry / create_driver (backend selection)
//!     ↓
//! Driver (opens handles against endpoint nodes)
//!     ↓
//! Database (bound to one namespace+table, CRUD + Search)
//! ```
//!
//! # Example Usage
//!
//! ```ignore
//! use recordstore::{DriverRegistry, DatabaseInfo, Node, Record, SearchQuery, StoreConfig};
//!
//! let registry = DriverRegistry::with_builtin_drivers(&StoreConfig::default())?;
//! let db = registry.open("redis", &[Node::new("localhost", 6379)])?;
//! db.init(&DatabaseInfo::new("blog", "posts"))?;
//!
//! db.create(&mut Record::new("1").with_field("title", "hello"))?;
//! let posts = db.search(&SearchQuery::all().term("title", "hello"))?;
//! db.close()?;
//! ```

// Core modules
pub mod factory;
pub mod registry;
pub mod traits;
pub mod types;

pub(crate) mod handle;

// Driver implementations
#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

// Public API re-exports
pub use factory::create_driver;
pub use registry::DriverRegistry;
pub use traits::{Database, Driver};
pub use types::DriverKind;
