// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Redis driver implementation
//!
//! Each table gets its own client, multiplexed onto one of `slot_count`
//! logical databases chosen by a deterministic hash of the table name. Tables
//! that hash to the same slot share a keyspace; collisions are accepted.
//!
//! ```text
//! <id>                              -> record JSON
//! __recordstore:<table>:created     -> sorted set, member <id>, score created
//! ```
//!
//! The sorted set is the secondary index search scans. Record ids may not
//! start with `__recordstore:`, the prefix of every key the driver owns.

use super::handle::{first_node, paginate, stamp_write, HandleState};
use super::traits::{Database, Driver};
use super::types::DriverKind;
use crate::config::RedisConfig;
use crate::error::{DbError, DbResult};
use crate::model::{DatabaseInfo, Node, Record, SearchQuery};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use redis::{Commands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::collections::HashMap;
use std::sync::Arc;

/// Ids fetched per MGET during a filtered search
const SCAN_BATCH: usize = 256;

/// Prefix of driver-owned keys
const KEY_PREFIX: &str = "__recordstore:";

/// Logical database a table lives in
pub fn slot_for_table(table: &str, slot_count: u32) -> i64 {
    i64::from(fnv1a_32(table.as_bytes()) % slot_count.max(1))
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    bytes
        .iter()
        .fold(OFFSET_BASIS, |hash, b| (hash ^ u32::from(*b)).wrapping_mul(PRIME))
}

/// Sorted set indexing a table's record ids by `created`
pub fn index_key(table: &str) -> String {
    format!("{}{}:created", KEY_PREFIX, table)
}

/// Record ids may not collide with driver-owned keys
fn check_id(id: &str) -> DbResult<()> {
    if id.starts_with(KEY_PREFIX) {
        return Err(DbError::InvalidRecord(format!(
            "record id '{}' uses the reserved prefix '{}'",
            id, KEY_PREFIX
        )));
    }
    Ok(())
}

/// Redis driver
pub struct RedisDriver {
    config: RedisConfig,
}

impl RedisDriver {
    pub fn new(config: RedisConfig) -> Self {
        Self { config }
    }
}

impl Driver for RedisDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Redis
    }

    // Clients are created per table at init; nothing is dialed here.
    fn new_db(&self, nodes: &[Node]) -> DbResult<Box<dyn Database>> {
        let node = first_node(nodes)?;
        debug!("Opening redis database handle for {}", node);

        Ok(Box::new(RedisDatabase {
            node: node.clone(),
            config: self.config.clone(),
            inner: RwLock::new(RedisInner {
                clients: HashMap::new(),
                state: HandleState::Unbound,
            }),
        }))
    }
}

/// Client for one table plus its lazily opened connection
struct TableClient {
    client: redis::Client,
    connection: Mutex<Option<redis::Connection>>,
}

impl TableClient {
    fn open(node: &Node, config: &RedisConfig, slot: i64) -> DbResult<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(node.address.clone(), node.port),
            redis: RedisConnectionInfo {
                db: slot,
                password: config.password.clone(),
                ..Default::default()
            },
        };
        Ok(Self {
            client: redis::Client::open(info)?,
            connection: Mutex::new(None),
        })
    }

    /// Run `f` on the table's connection, reconnecting if the last one broke
    fn with_connection<T, F>(&self, config: &RedisConfig, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    {
        let mut guard = self.connection.lock();
        if guard.is_none() {
            let connection = self
                .client
                .get_connection_with_timeout(config.connect_timeout())?;
            connection.set_read_timeout(config.io_timeout())?;
            connection.set_write_timeout(config.io_timeout())?;
            *guard = Some(connection);
        }

        let result = match guard.as_mut() {
            Some(connection) => f(connection),
            None => return Err(DbError::NotAvailable("redis connection unavailable".into())),
        };
        result.map_err(|e| {
            if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
                *guard = None;
            }
            DbError::from(e)
        })
    }
}

struct TableBinding {
    database: DatabaseInfo,
    client: Arc<TableClient>,
}

struct RedisInner {
    clients: HashMap<String, Arc<TableClient>>,
    state: HandleState<TableBinding>,
}

/// Redis database handle
pub struct RedisDatabase {
    node: Node,
    config: RedisConfig,
    inner: RwLock<RedisInner>,
}

impl RedisDatabase {
    fn write(&self, record: &mut Record) -> DbResult<()> {
        check_id(&record.id)?;
        let inner = self.inner.read();
        let binding = inner.state.bound()?;

        stamp_write(record)?;
        let payload = serde_json::to_string(&*record)?;
        let index = index_key(&binding.database.table);

        debug!("Writing record '{}' to {}", record.id, binding.database);
        binding.client.with_connection(&self.config, |conn| {
            redis::pipe()
                .atomic()
                .set(&record.id, &payload)
                .ignore()
                .zadd(&index, &record.id, record.created)
                .ignore()
                .query::<()>(conn)
        })
    }

    /// Decode the values stored under `ids`; missing or empty values are `None`
    fn fetch(&self, binding: &TableBinding, ids: &[String]) -> DbResult<Vec<Option<Record>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Option<String>> = binding
            .client
            .with_connection(&self.config, |conn| redis::cmd("MGET").arg(ids).query(conn))?;

        let mut stale = 0;
        let records = values
            .into_iter()
            .map(|value| -> DbResult<Option<Record>> {
                match value {
                    Some(json) if !json.is_empty() => Ok(Some(serde_json::from_str(&json)?)),
                    _ => {
                        stale += 1;
                        Ok(None)
                    }
                }
            })
            .collect::<DbResult<Vec<_>>>()?;

        if stale > 0 {
            warn!(
                "Skipped {} stale index entries in {}",
                stale, binding.database
            );
        }
        Ok(records)
    }

    fn ranked_ids(
        &self,
        binding: &TableBinding,
        reverse: bool,
        start: isize,
        stop: isize,
    ) -> DbResult<Vec<String>> {
        let index = index_key(&binding.database.table);
        binding.client.with_connection(&self.config, |conn| {
            if reverse {
                conn.zrevrange(&index, start, stop)
            } else {
                conn.zrange(&index, start, stop)
            }
        })
    }
}

impl Database for RedisDatabase {
    fn init(&self, database: &DatabaseInfo) -> DbResult<()> {
        let mut inner = self.inner.write();
        inner.state.ensure_open()?;
        database.validate()?;

        let slot = slot_for_table(&database.table, self.config.slot_count);
        let client = match inner.clients.get(&database.table) {
            Some(client) => client.clone(),
            None => Arc::new(TableClient::open(&self.node, &self.config, slot)?),
        };
        client.with_connection(&self.config, |conn| {
            redis::cmd("PING").query::<String>(conn)
        })?;

        inner
            .clients
            .insert(database.table.clone(), client.clone());
        inner.state = HandleState::Bound(TableBinding {
            database: database.clone(),
            client,
        });
        info!("Redis handle bound to {} (db slot {})", database, slot);
        Ok(())
    }

    fn close(&self) -> DbResult<()> {
        let mut inner = self.inner.write();
        let released = inner.clients.len();
        inner.clients.clear();
        inner.state = HandleState::Closed;
        if released > 0 {
            info!("Redis handle closed, released {} table clients", released);
        }
        Ok(())
    }

    fn create(&self, record: &mut Record) -> DbResult<()> {
        self.write(record)
    }

    fn read(&self, id: &str) -> DbResult<Option<Record>> {
        check_id(id)?;
        let inner = self.inner.read();
        let binding = inner.state.bound()?;

        let value: Option<String> = binding
            .client
            .with_connection(&self.config, |conn| conn.get(id))?;
        match value {
            Some(json) if !json.is_empty() => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }

    fn update(&self, record: &mut Record) -> DbResult<()> {
        self.write(record)
    }

    fn delete(&self, id: &str) -> DbResult<()> {
        check_id(id)?;
        let inner = self.inner.read();
        let binding = inner.state.bound()?;
        let index = index_key(&binding.database.table);

        debug!("Deleting record '{}' from {}", id, binding.database);
        binding.client.with_connection(&self.config, |conn| {
            redis::pipe()
                .atomic()
                .del(id)
                .ignore()
                .zrem(&index, id)
                .ignore()
                .query::<()>(conn)
        })
    }

    fn search(&self, query: &SearchQuery) -> DbResult<Vec<Record>> {
        let inner = self.inner.read();
        let binding = inner.state.bound()?;
        let (offset, limit) = query.page();

        if query.terms.is_empty() {
            let start = isize::try_from(offset).unwrap_or(isize::MAX);
            let stop = isize::try_from(offset.saturating_add(limit) - 1).unwrap_or(isize::MAX);
            let ids = self.ranked_ids(binding, query.reverse, start, stop)?;
            return Ok(self.fetch(binding, &ids)?.into_iter().flatten().collect());
        }

        let ids = self.ranked_ids(binding, query.reverse, 0, -1)?;
        let mut matched = Vec::new();
        for chunk in ids.chunks(SCAN_BATCH) {
            matched.extend(
                self.fetch(binding, chunk)?
                    .into_iter()
                    .flatten()
                    .filter(|record| query.matches(record)),
            );
            if matched.len() >= offset.saturating_add(limit) {
                break;
            }
        }

        debug!(
            "Search on {} scanned {} index entries",
            binding.database,
            ids.len()
        );
        Ok(paginate(matched, offset, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> RedisConfig {
        RedisConfig {
            connect_timeout_ms: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_slot_is_deterministic_and_bounded() {
        for table in ["posts", "users", "comments", ""] {
            let slot = slot_for_table(table, 16);
            assert!((0..16).contains(&slot));
            assert_eq!(slot, slot_for_table(table, 16));
        }
        assert_eq!(slot_for_table("posts", 1), 0);
        assert_eq!(slot_for_table("posts", 0), 0);
        assert_eq!(
            slot_for_table("a", 16),
            i64::from(0xe40c_292c_u32 % 16)
        );
    }

    #[test]
    fn test_index_key_is_per_table() {
        assert_eq!(index_key("posts"), "__recordstore:posts:created");
        assert_ne!(index_key("posts"), index_key("users"));
    }

    #[test]
    fn test_driver_owned_keys_are_not_record_ids() {
        let driver = RedisDriver::new(unreachable_config());
        let db = driver.new_db(&[Node::new("127.0.0.1", 1)]).unwrap();
        let reserved = index_key("posts");

        let mut record = Record::new(reserved.as_str());
        assert!(matches!(db.create(&mut record), Err(DbError::InvalidRecord(_))));
        assert!(matches!(db.update(&mut record), Err(DbError::InvalidRecord(_))));
        assert_eq!(record.created, 0);
        assert!(matches!(db.read(&reserved), Err(DbError::InvalidRecord(_))));
        assert!(matches!(db.delete(&reserved), Err(DbError::InvalidRecord(_))));

        assert!(check_id("recordstore:1").is_ok());
        assert!(check_id("_recordstore:1").is_ok());
    }

    #[test]
    fn test_new_db_requires_nodes_but_does_not_dial() {
        let driver = RedisDriver::new(unreachable_config());
        assert!(matches!(driver.new_db(&[]), Err(DbError::NotAvailable(_))));
        assert!(driver.new_db(&[Node::new("127.0.0.1", 1)]).is_ok());
    }

    #[test]
    fn test_crud_before_init_is_not_found() {
        let driver = RedisDriver::new(unreachable_config());
        let db = driver.new_db(&[Node::new("127.0.0.1", 1)]).unwrap();

        let mut record = Record::new("1");
        assert!(matches!(db.create(&mut record), Err(DbError::NotFound(_))));
        assert!(matches!(db.update(&mut record), Err(DbError::NotFound(_))));
        assert_eq!(record.updated, 0);
        assert!(matches!(db.read("1"), Err(DbError::NotFound(_))));
        assert!(matches!(db.delete("1"), Err(DbError::NotFound(_))));
        assert!(matches!(
            db.search(&SearchQuery::all()),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_init_against_unreachable_node_fails_and_stays_unbound() {
        let driver = RedisDriver::new(unreachable_config());
        let db = driver.new_db(&[Node::new("127.0.0.1", 1)]).unwrap();

        let err = db.init(&DatabaseInfo::new("blog", "posts")).unwrap_err();
        assert!(matches!(err, DbError::Backend { .. }));
        assert!(matches!(db.read("1"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_close_is_safe_without_clients() {
        let driver = RedisDriver::new(unreachable_config());
        let db = driver.new_db(&[Node::new("127.0.0.1", 1)]).unwrap();

        db.close().unwrap();
        db.close().unwrap();
        assert!(matches!(db.read("1"), Err(DbError::NotAvailable(_))));
        assert!(matches!(
            db.init(&DatabaseInfo::new("blog", "posts")),
            Err(DbError::NotAvailable(_))
        ));
    }
}
