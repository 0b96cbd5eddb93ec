// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver and database handle traits
//!
//! All backends implement these traits so callers can address heterogeneous
//! datastores through one contract.

use super::types::DriverKind;
use crate::error::DbResult;
use crate::model::{DatabaseInfo, Node, Record, SearchQuery};

/// Bound, stateful connection to one namespace+table pair
///
/// A handle starts unbound, becomes usable after [`Database::init`] and is
/// terminal after [`Database::close`]. Implementations guard their local state
/// with a single reader/writer lock: `init` and `close` take it exclusively,
/// every other operation takes it shared. Calls block on backend I/O.
pub trait Database: Send + Sync {
    /// Bind to a namespace and table, creating backend resources as needed.
    /// Calling again rebinds.
    fn init(&self, database: &DatabaseInfo) -> DbResult<()>;

    /// Release the underlying connection. Safe on a never-bound handle.
    fn close(&self) -> DbResult<()>;

    /// Upsert a record, stamping `created` (if zero) and `updated`
    fn create(&self, record: &mut Record) -> DbResult<()>;

    /// Fetch a record by id. Absence is `Ok(None)`, not an error.
    fn read(&self, id: &str) -> DbResult<Option<Record>>;

    /// Same semantics as [`Database::create`]
    fn update(&self, record: &mut Record) -> DbResult<()>;

    /// Remove a record if present
    fn delete(&self, id: &str) -> DbResult<()>;

    /// Records matching every term, ordered by creation time
    fn search(&self, query: &SearchQuery) -> DbResult<Vec<Record>>;
}

/// Factory for database handles of one backend
pub trait Driver: Send + Sync {
    fn kind(&self) -> DriverKind;

    /// Open an unbound handle against the first of `nodes`
    fn new_db(&self, nodes: &[Node]) -> DbResult<Box<dyn Database>>;
}
