//! Meetings, participants and advisory slot locks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, SchedulingError};

/// Meeting lifecycle state.
///
/// `Cancelled` and `Completed` are terminal: reschedule and cancel reject
/// them with `InvalidState` (cancel of a cancelled meeting is an idempotent
/// success).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl MeetingStatus {
    /// Canonical string form as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse the stored string form.
    ///
    /// # Errors
    /// Returns `Internal` for unrecognised values, since only this crate
    /// writes them.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => {
                Err(SchedulingError::Internal(format!("unknown meeting status: {other}")))
            }
        }
    }

    /// Whether the meeting can still change (reschedule).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

/// A booked meeting.
///
/// Exactly one of `event_type_id` / `group_event_type_id` is set. Times are
/// UTC instants; `timezone` is only a display hint for the booker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    pub event_type_id: Option<Uuid>,
    pub group_event_type_id: Option<Uuid>,
    pub host_user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timezone: String,
    pub status: MeetingStatus,
    pub calendar_event_id: Option<String>,
    pub calendar_provider: Option<String>,
}

/// A participant row attached to a meeting.
///
/// Host rows carry the host's `user_id`; guest rows have none. Group
/// meetings get one host row per participating host, which is how the
/// ledger knows a meeting occupies every host's calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingParticipant {
    pub meeting_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub is_host: bool,
    pub notes: Option<String>,
}

/// Participant details captured from the booking form, before a meeting id
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
}

impl NewParticipant {
    /// Trim and validate the guest-supplied fields.
    ///
    /// # Errors
    /// Returns `InvalidInput` when name or email is blank or the email has
    /// no `@`.
    pub fn normalized(&self) -> Result<Self> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() {
            return Err(SchedulingError::InvalidInput("participant name is required".into()));
        }
        if email.is_empty() {
            return Err(SchedulingError::InvalidInput("participant email is required".into()));
        }
        if !email.contains('@') {
            return Err(SchedulingError::InvalidInput(format!(
                "participant email looks malformed: {email}"
            )));
        }
        let notes = self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            notes: notes.map(str::to_string),
        })
    }
}

/// Ephemeral advisory reservation of a slot between display and commit.
///
/// Expired locks must never block a slot; correctness lives in the booking
/// transaction, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotLock {
    pub lock_id: String,
    pub user_id: Uuid,
    pub event_type_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Committed ledger operation, carried by notification dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingOperation {
    Booked,
    Rescheduled,
    Cancelled,
}

impl BookingOperation {
    /// Wire form used in the notification payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Rescheduled => "rescheduled",
            Self::Cancelled => "cancelled",
        }
    }
}
