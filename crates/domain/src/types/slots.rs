//! Computed bookable slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bookable slot of exactly the event type's duration.
///
/// The UTC bounds are canonical and what booking submits; the `_local`
/// strings are the same instants rendered in the requester's timezone
/// (RFC 3339 with offset) for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub slot_start_local: String,
    pub slot_end_local: String,
}
