//! Availability resolution and slot booking
//!
//! `intervals` holds the pure interval-set arithmetic, `slots` projects
//! availability rules and the booking ledger into bookable slots, and
//! `booking` orchestrates the atomic ledger operations behind the port
//! traits in `ports`.

pub mod booking;
pub mod intervals;
pub mod ports;
pub mod slots;
