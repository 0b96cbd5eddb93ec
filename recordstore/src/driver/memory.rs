// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory driver implementation for testing

use super::handle::{first_node, paginate, stamp_write, HandleState};
use super::traits::{Database, Driver};
use super::types::DriverKind;
use crate::error::DbResult;
use crate::model::{DatabaseInfo, Node, Record, SearchQuery};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

type Table = HashMap<String, Record>;
type Store = Arc<RwLock<HashMap<DatabaseInfo, Table>>>;

/// In-memory driver
///
/// Every handle opened from the same driver shares one store, so two handles
/// bound to the same namespace+table see each other's writes.
#[derive(Default)]
pub struct MemoryDriver {
    store: Store,
}

/// In-memory database handle
pub struct MemoryDatabase {
    store: Store,
    state: RwLock<HandleState<DatabaseInfo>>,
}

impl MemoryDriver {
    /// Create a new memory driver with an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for MemoryDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Memory
    }

    fn new_db(&self, nodes: &[Node]) -> DbResult<Box<dyn Database>> {
        let node = first_node(nodes)?;
        debug!("Opening memory database handle (node {})", node);

        Ok(Box::new(MemoryDatabase {
            store: self.store.clone(),
            state: RwLock::new(HandleState::Unbound),
        }))
    }
}

impl Database for MemoryDatabase {
    fn init(&self, database: &DatabaseInfo) -> DbResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        database.validate()?;

        self.store.write().entry(database.clone()).or_default();
        *state = HandleState::Bound(database.clone());
        info!("Memory handle bound to {}", database);
        Ok(())
    }

    fn close(&self) -> DbResult<()> {
        let mut state = self.state.write();
        *state = HandleState::Closed;
        Ok(())
    }

    fn create(&self, record: &mut Record) -> DbResult<()> {
        let state = self.state.read();
        let database = state.bound()?;

        stamp_write(record)?;
        debug!("Writing record '{}' to {}", record.id, database);
        self.store
            .write()
            .entry(database.clone())
            .or_default()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn read(&self, id: &str) -> DbResult<Option<Record>> {
        let state = self.state.read();
        let database = state.bound()?;

        let store = self.store.read();
        Ok(store.get(database).and_then(|table| table.get(id)).cloned())
    }

    fn update(&self, record: &mut Record) -> DbResult<()> {
        self.create(record)
    }

    fn delete(&self, id: &str) -> DbResult<()> {
        let state = self.state.read();
        let database = state.bound()?;

        debug!("Deleting record '{}' from {}", id, database);
        if let Some(table) = self.store.write().get_mut(database) {
            table.remove(id);
        }
        Ok(())
    }

    fn search(&self, query: &SearchQuery) -> DbResult<Vec<Record>> {
        let state = self.state.read();
        let database = state.bound()?;
        let (offset, limit) = query.page();

        let store = self.store.read();
        let mut matched: Vec<Record> = store
            .get(database)
            .map(|table| {
                table
                    .values()
                    .filter(|record| query.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matched.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        if query.reverse {
            matched.reverse();
        }

        debug!(
            "Search on {} matched {} records (offset {}, limit {})",
            database,
            matched.len(),
            offset,
            limit
        );
        Ok(paginate(matched, offset, limit))
    }
}
