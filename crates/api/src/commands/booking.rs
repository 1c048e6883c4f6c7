//! Booking commands
//!
//! Mutations fold the scheduling outcome into a `{success, error}` response
//! so callers can branch on the error variant (`SlotConflict` prompts a
//! re-fetch, `NoticeViolation`/`DailyLimitExceeded` explain the constraint).

use serde::{Deserialize, Serialize};
use slotbook_core::{Actor, BookGroupMeetingRequest, BookMeetingRequest};
use slotbook_domain::{NewParticipant, Result, SchedulingError};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::AppContext;

/// Booking form submission for a single-host event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeetingCommand {
    pub event_type_id: String,
    pub host_user_id: String,
    /// ISO-8601 slot start
    pub start_time: String,
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
    /// Requester timezone, recorded on the meeting for display
    pub timezone: String,
    pub lock_id: Option<String>,
}

/// Booking form submission for a group event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookGroupMeetingCommand {
    pub group_event_type_id: String,
    pub start_time: String,
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSlotCommand {
    pub host_user_id: String,
    pub event_type_id: String,
    pub start_time: String,
    pub end_time: String,
    pub lock_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleMeetingCommand {
    pub meeting_id: String,
    pub new_start_time: String,
    /// Opaque token from the participant's confirmation link
    pub participant_token: Option<String>,
    /// Set when the authenticated host acts on their own meeting
    pub host_user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelMeetingCommand {
    pub meeting_id: String,
    pub participant_token: Option<String>,
    pub host_user_id: Option<String>,
}

/// Outcome of a booking attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub success: bool,
    pub meeting_id: Option<Uuid>,
    pub error: Option<SchedulingError>,
}

impl BookingResponse {
    fn booked(meeting_id: Uuid) -> Self {
        Self { success: true, meeting_id: Some(meeting_id), error: None }
    }

    fn failed(error: SchedulingError) -> Self {
        Self { success: false, meeting_id: None, error: Some(error) }
    }
}

/// Outcome of a reschedule or cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub success: bool,
    pub error: Option<SchedulingError>,
}

impl MutationResponse {
    fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self { success: true, error: None },
            Err(e) => Self { success: false, error: Some(e) },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSlotResponse {
    pub accepted: bool,
}

/// Best-effort advisory hold on a slot while the booking form is open.
/// A rejected or failed lock never blocks booking.
///
/// # Errors
/// `InvalidInput` for malformed ids or timestamps.
#[instrument(skip(ctx, command), fields(lock_id = %command.lock_id))]
pub async fn lock_time_slot(ctx: &AppContext, command: LockSlotCommand) -> Result<LockSlotResponse> {
    let host_user_id = parse_uuid("hostUserId", &command.host_user_id)?;
    let event_type_id = parse_uuid("eventTypeId", &command.event_type_id)?;
    let start = parse_timestamp("startTime", &command.start_time)?;
    let end = parse_timestamp("endTime", &command.end_time)?;

    let accepted = ctx
        .booking_service
        .lock_slot(host_user_id, event_type_id, start, end, command.lock_id)
        .await;
    Ok(LockSlotResponse { accepted })
}

/// Book a single-host meeting. The atomic re-validation inside the ledger
/// transaction is the correctness mechanism; any advisory lock merely
/// improves the odds.
#[instrument(skip(ctx, command))]
pub async fn book_meeting(ctx: &AppContext, command: BookMeetingCommand) -> BookingResponse {
    let result = async {
        let request = BookMeetingRequest {
            event_type_id: parse_uuid("eventTypeId", &command.event_type_id)?,
            host_user_id: parse_uuid("hostUserId", &command.host_user_id)?,
            start_time: parse_timestamp("startTime", &command.start_time)?,
            participant: NewParticipant {
                name: command.name,
                email: command.email,
                notes: command.notes,
            },
            timezone: command.timezone,
            lock_id: command.lock_id,
        };
        ctx.booking_service.book_meeting(request).await
    }
    .await;

    match result {
        Ok(meeting_id) => {
            info!(%meeting_id, "Meeting booked");
            BookingResponse::booked(meeting_id)
        }
        Err(e) => BookingResponse::failed(e),
    }
}

/// Book a group meeting across every host of the group event type.
#[instrument(skip(ctx, command))]
pub async fn book_group_meeting(
    ctx: &AppContext,
    command: BookGroupMeetingCommand,
) -> BookingResponse {
    let result = async {
        let request = BookGroupMeetingRequest {
            group_event_type_id: parse_uuid("groupEventTypeId", &command.group_event_type_id)?,
            start_time: parse_timestamp("startTime", &command.start_time)?,
            participant: NewParticipant {
                name: command.name,
                email: command.email,
                notes: command.notes,
            },
            timezone: command.timezone,
        };
        ctx.booking_service.book_group_meeting(request).await
    }
    .await;

    match result {
        Ok(meeting_id) => {
            info!(%meeting_id, "Group meeting booked");
            BookingResponse::booked(meeting_id)
        }
        Err(e) => BookingResponse::failed(e),
    }
}

/// Move a meeting to a new start, keeping its duration. Only the host or the
/// holder of the participant token may reschedule.
#[instrument(skip(ctx, command))]
pub async fn reschedule_meeting(
    ctx: &AppContext,
    command: RescheduleMeetingCommand,
) -> MutationResponse {
    let result = async {
        let meeting_id = parse_uuid("meetingId", &command.meeting_id)?;
        let new_start = parse_timestamp("newStartTime", &command.new_start_time)?;
        let actor = resolve_actor(command.participant_token, command.host_user_id.as_deref())?;
        ctx.booking_service.reschedule_meeting(meeting_id, new_start, actor).await
    }
    .await;

    MutationResponse::from_result(result)
}

/// Cancel a meeting. Cancelling an already-cancelled meeting succeeds
/// without side effects.
#[instrument(skip(ctx, command))]
pub async fn cancel_meeting(ctx: &AppContext, command: CancelMeetingCommand) -> MutationResponse {
    let result = async {
        let meeting_id = parse_uuid("meetingId", &command.meeting_id)?;
        let actor = resolve_actor(command.participant_token, command.host_user_id.as_deref())?;
        ctx.booking_service.cancel_meeting(meeting_id, actor).await
    }
    .await;

    MutationResponse::from_result(result)
}

fn resolve_actor(token: Option<String>, host_user_id: Option<&str>) -> Result<Actor> {
    if let Some(token) = token {
        return Ok(Actor::Participant { token });
    }
    match host_user_id {
        Some(id) => Ok(Actor::Host(parse_uuid("hostUserId", id)?)),
        None => Err(SchedulingError::Unauthorized(
            "a participant token or host identity is required".to_string(),
        )),
    }
}
