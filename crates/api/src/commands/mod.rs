//! Typed command layer
//!
//! The external surface of the engine: string-typed identifiers, calendar
//! dates, and IANA timezone names in; serde-friendly DTOs out. Availability
//! queries surface typed errors directly; booking mutations fold the outcome
//! into a `{success, error}` response so callers can branch on the variant.

pub mod availability;
pub mod booking;

pub use availability::{
    calculate_availability, calculate_group_availability, get_availability_rules,
    replace_availability_rules, resolve_booking_link, AvailabilityRuleInput,
};
pub use booking::{
    book_group_meeting, book_meeting, cancel_meeting, lock_time_slot, reschedule_meeting,
    BookGroupMeetingCommand, BookMeetingCommand, BookingResponse, CancelMeetingCommand,
    LockSlotCommand, LockSlotResponse, MutationResponse, RescheduleMeetingCommand,
};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use slotbook_domain::{Result, SchedulingError};
use uuid::Uuid;

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| SchedulingError::InvalidInput(format!("{field} is not a valid uuid: {value}")))
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        SchedulingError::InvalidRange(format!("{field} is not a calendar date: {value}"))
    })
}

pub(crate) fn parse_timezone(value: &str) -> Result<Tz> {
    value
        .parse::<Tz>()
        .map_err(|_| SchedulingError::InvalidInput(format!("Unknown timezone: {value}")))
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            SchedulingError::InvalidInput(format!("{field} is not an ISO-8601 timestamp: {value}"))
        })
}
