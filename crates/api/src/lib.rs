//! # Slotbook API
//!
//! Typed command layer over the scheduling engine, plus the application
//! context that wires configuration, storage, and services together.
//!
//! Commands speak strings at the boundary (ISO-8601 timestamps, calendar
//! dates, IANA timezone names, uuid strings) and translate to the typed
//! core requests; all scheduling decisions live in `slotbook-core`.

pub mod commands;
pub mod context;
pub mod logging;

pub use context::AppContext;
