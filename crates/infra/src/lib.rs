//! # Slotbook Infrastructure
//!
//! Infrastructure implementations of core scheduling ports.
//!
//! This crate contains:
//! - SQLite-backed repositories (availability, event types, meetings, locks)
//! - Outbound HTTP notification dispatch
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `slotbook-core`
//! - Depends on `slotbook-common` for pooling and `slotbook-domain` for types
//! - Contains all "impure" code (I/O, clocks, network)

pub mod clock;
pub mod config;
pub mod database;
pub mod errors;
pub mod notifications;

// Re-export commonly used items
pub use clock::SystemClock;
pub use database::{
    DbManager, SqliteAvailabilityRepository, SqliteEventTypeRepository, SqliteHostDirectory,
    SqliteMeetingLedger, SqliteSlotLockRepository,
};
pub use errors::InfraError;
pub use notifications::HttpBookingNotifier;
