// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver registry
//!
//! Maps backend names to drivers. A registry is assembled once during startup
//! and then shared read-only (typically as `Arc<DriverRegistry>`), so lookups
//! need no locking.

use super::factory::create_driver;
use super::traits::{Database, Driver};
use super::types::DriverKind;
use crate::config::StoreConfig;
use crate::error::{DbError, DbResult};
use crate::model::Node;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of drivers keyed by name
#[derive(Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every backend compiled into this build
    ///
    /// Each driver is registered under its [`DriverKind`] name.
    pub fn with_builtin_drivers(config: &StoreConfig) -> DbResult<Self> {
        let mut registry = Self::new();
        for kind in DriverKind::ALL.into_iter().filter(DriverKind::is_enabled) {
            registry.register(kind.name(), create_driver(kind, config)?)?;
        }
        Ok(registry)
    }

    /// Register a driver under a unique name
    ///
    /// # Returns
    /// * `Err(DbError::DuplicateDriver)` if the name is taken
    pub fn register(&mut self, name: &str, driver: Arc<dyn Driver>) -> DbResult<()> {
        if self.drivers.contains_key(name) {
            return Err(DbError::DuplicateDriver(name.to_string()));
        }
        log::info!("Registered {} driver as '{}'", driver.kind(), name);
        self.drivers.insert(name.to_string(), driver);
        Ok(())
    }

    /// Look up a driver by name
    ///
    /// # Returns
    /// * `Err(DbError::DriverNotFound)` if nothing is registered under `name`
    pub fn get(&self, name: &str) -> DbResult<Arc<dyn Driver>> {
        self.drivers
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::DriverNotFound(name.to_string()))
    }

    /// Look up a driver and open an unbound handle against `nodes`
    pub fn open(&self, name: &str, nodes: &[Node]) -> DbResult<Box<dyn Database>> {
        self.get(name)?.new_db(nodes)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.drivers.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;

    #[test]
    fn test_builtin_drivers_are_registered_by_kind_name() {
        let registry = DriverRegistry::with_builtin_drivers(&StoreConfig::default()).unwrap();

        assert!(registry.contains("memory"));
        assert_eq!(
            registry.contains("elasticsearch"),
            cfg!(feature = "elasticsearch")
        );
        assert_eq!(registry.contains("redis"), cfg!(feature = "redis"));
        assert_eq!(
            registry.len(),
            DriverKind::ALL.iter().filter(|k| k.is_enabled()).count()
        );
    }

    #[test]
    fn test_unknown_driver() {
        let registry = DriverRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("cassandra"),
            Err(DbError::DriverNotFound(name)) if name == "cassandra"
        ));
        assert!(matches!(
            registry.open("cassandra", &[Node::new("localhost", 1)]),
            Err(DbError::DriverNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = DriverRegistry::new();
        registry
            .register("primary", Arc::new(MemoryDriver::new()))
            .unwrap();

        let result = registry.register("primary", Arc::new(MemoryDriver::new()));
        assert!(matches!(result, Err(DbError::DuplicateDriver(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_custom_names_and_ordering() {
        let mut registry = DriverRegistry::new();
        registry
            .register("scratch", Arc::new(MemoryDriver::new()))
            .unwrap();
        registry
            .register("archive", Arc::new(MemoryDriver::new()))
            .unwrap();

        assert_eq!(registry.names(), vec!["archive", "scratch"]);
        assert_eq!(registry.get("archive").unwrap().kind(), DriverKind::Memory);
    }

    #[test]
    fn test_open_propagates_driver_errors() {
        let registry = DriverRegistry::with_builtin_drivers(&StoreConfig::default()).unwrap();
        assert!(matches!(
            registry.open("memory", &[]),
            Err(DbError::NotAvailable(_))
        ));
        assert!(registry.open("memory", &[Node::new("localhost", 1)]).is_ok());
    }
}
