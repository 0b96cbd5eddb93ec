// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lifecycle state and helpers shared by handle implementations

use crate::error::{DbError, DbResult};
use crate::model::{Node, Record};

/// Handle lifecycle: `Unbound -> Bound -> Closed`
///
/// `B` is whatever the backend needs once bound (index names, clients, ...).
#[derive(Debug)]
pub(crate) enum HandleState<B> {
    Unbound,
    Bound(B),
    Closed,
}

impl<B> HandleState<B> {
    /// Binding for CRUD/Search
    pub(crate) fn bound(&self) -> DbResult<&B> {
        match self {
            HandleState::Bound(binding) => Ok(binding),
            HandleState::Unbound => Err(DbError::NotFound(
                "database handle is not initialized".to_string(),
            )),
            HandleState::Closed => Err(DbError::NotAvailable(
                "database handle is closed".to_string(),
            )),
        }
    }

    /// Fails once the handle has been closed
    pub(crate) fn ensure_open(&self) -> DbResult<()> {
        match self {
            HandleState::Closed => Err(DbError::NotAvailable(
                "database handle is closed".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// The node a driver connects to; only the first one is consulted
pub(crate) fn first_node(nodes: &[Node]) -> DbResult<&Node> {
    nodes
        .first()
        .ok_or_else(|| DbError::NotAvailable("no storage nodes supplied".to_string()))
}

pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Validate and stamp a record about to be written
pub(crate) fn stamp_write(record: &mut Record) -> DbResult<()> {
    record.validate()?;
    record.stamp(unix_now());
    Ok(())
}

/// Apply offset/limit to an already ordered result
pub(crate) fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}
