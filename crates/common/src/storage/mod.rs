//! SQLite storage layer
//!
//! r2d2-based connection pooling with per-connection pragmas. The booking
//! ledger relies on SQLite's single-writer model for its atomic
//! check-then-insert transactions, so every connection runs in WAL mode with
//! a busy timeout instead of failing fast on lock contention.

pub mod config;
pub mod error;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use pool::SqlitePool;
