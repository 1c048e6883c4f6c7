//! Recurring weekly availability windows
//!
//! Rules are stored as host-local wall-clock times; the slot calculator
//! projects them into UTC per calendar day using the host's timezone.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, SchedulingError};

/// One recurring weekly availability window for a host.
///
/// `day_of_week` follows the original store's convention: 0 = Sunday through
/// 6 = Saturday. Multiple non-overlapping rules per day are permitted and
/// treated as a union when computing slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub host_user_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl AvailabilityRule {
    /// Validate the rule invariants: a real weekday index and a non-empty
    /// window.
    ///
    /// # Errors
    /// Returns `InvalidInput` when `day_of_week > 6` or
    /// `start_time >= end_time`.
    pub fn validate(&self) -> Result<()> {
        if self.day_of_week > 6 {
            return Err(SchedulingError::InvalidInput(format!(
                "day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        if self.start_time >= self.end_time {
            return Err(SchedulingError::InvalidInput(format!(
                "availability window must not be empty: {} >= {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}
