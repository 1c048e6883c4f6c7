//! # Slotbook Common
//!
//! Shared infrastructure foundation for the slotbook workspace.
//!
//! This crate contains:
//! - SQLite connection pooling (`storage`)
//! - Storage error types
//!
//! ## Architecture
//! - No dependencies on other slotbook crates
//! - No business logic; the domain and core crates never reach down here
//!   except through the pool handle held by infra

pub mod storage;

pub use storage::error::{StorageError, StorageResult};
pub use storage::{SqlitePool, SqlitePoolConfig};
