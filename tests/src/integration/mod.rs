//! # Integration Tests
//!
//! - `scenarios`: the reference operator scenarios
//! - `flows`: longer multi-step workflows through the public API
//! - `concurrency`: many threads against one ledger
//! - `persistence`: JSON file storage across restarts and the runtime container

pub mod flows;
pub mod persistence;
