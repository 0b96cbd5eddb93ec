//! Bound handles for integration tests
//!
//! Live backends are addressed through `host:port` environment variables so
//! the same suite can run against a local cluster.

#![allow(dead_code)]

use recordstore::{
    create_driver, Database, DatabaseInfo, DriverKind, Node, StoreConfig,
};

pub const ENV_REDIS_NODE: &str = "RECORDSTORE_REDIS_NODE";
pub const ENV_ES_NODE: &str = "RECORDSTORE_ES_NODE";

/// A bound handle on a table nobody else uses
pub struct HandleFixture {
    pub db: Box<dyn Database>,
    pub database: DatabaseInfo,
}

impl HandleFixture {
    /// Open and bind a handle for `kind` against `node`
    pub fn new(
        kind: DriverKind,
        config: &StoreConfig,
        node: Node,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let _ = env_logger::builder().is_test(true).try_init();

        let driver = create_driver(kind, config)?;
        let db = driver.new_db(&[node])?;

        // Unique namespace and table per test keeps runs apart
        let suffix = fastrand::u64(..);
        let database = DatabaseInfo::new(
            format!("recordstore_test_{}", suffix),
            format!("t{}", suffix),
        );
        db.init(&database)?;

        Ok(Self { db, database })
    }

    pub fn memory() -> Self {
        Self::new(
            DriverKind::Memory,
            &StoreConfig::default(),
            Node::new("localhost", 0),
        )
        .expect("memory fixture")
    }

    pub fn redis() -> Self {
        let node = live_node(ENV_REDIS_NODE, "127.0.0.1:6379");
        Self::new(DriverKind::Redis, &StoreConfig::default().with_env_overrides(), node)
            .expect("redis fixture; set RECORDSTORE_REDIS_NODE")
    }

    pub fn elasticsearch() -> Self {
        let node = live_node(ENV_ES_NODE, "127.0.0.1:9200");
        let mut config = StoreConfig::default().with_env_overrides();
        // Searches in the suite must see writes immediately
        config.elasticsearch.refresh_on_write = true;
        Self::new(DriverKind::Elasticsearch, &config, node)
            .expect("elasticsearch fixture; set RECORDSTORE_ES_NODE")
    }
}

impl Drop for HandleFixture {
    fn drop(&mut self) {
        let _ = self.db.close();
    }
}

pub fn live_node(var: &str, default: &str) -> Node {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .expect("node must be host:port")
}
