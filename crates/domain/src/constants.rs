//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! scheduling engine.

/// Furthest date a guest may book ahead of now.
pub const MAX_BOOKING_HORIZON_DAYS: i64 = 60;

/// Default minimum notice applied when an event type does not set one.
pub const DEFAULT_MINIMUM_NOTICE_HOURS: u32 = 24;

/// Lifetime of an advisory slot lock. Long enough to cover the booking form
/// confirm step, short enough that an abandoned lock frees the slot quickly.
pub const SLOT_LOCK_TTL_SECS: i64 = 120;

/// Minimum number of hosts on a group event type.
pub const MIN_GROUP_HOSTS: usize = 2;

/// Upper bound on booked meeting duration; rejects obviously corrupt event
/// types before they reach interval arithmetic.
pub const MAX_EVENT_DURATION_MINUTES: u32 = 24 * 60;
