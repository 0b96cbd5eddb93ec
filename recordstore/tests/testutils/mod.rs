//! Test utilities for RecordStore integration tests
//!
//! - contract: handle contract checks every backend must pass
//! - fixture: bound handles on fresh, uniquely named tables

pub mod contract;
pub mod fixture;
