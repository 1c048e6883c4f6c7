//! Availability commands

use serde::{Deserialize, Serialize};
use slotbook_domain::{AvailabilityRule, EventType, Result, SchedulingError, TimeSlot};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{parse_date, parse_timezone, parse_uuid};
use crate::AppContext;

/// One weekly rule as submitted by the availability editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRuleInput {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    /// Host-local wall clock, `HH:MM`
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

/// Compute bookable slots for a single-host event type.
///
/// Dates are calendar dates (`YYYY-MM-DD`) framed in the requester's
/// timezone; returned timestamps are ISO-8601.
///
/// # Errors
/// `InvalidInput` for malformed ids or timezone, `InvalidRange` for a bad
/// date window, `NotFound` for a missing or inactive event type.
#[instrument(skip(ctx))]
pub async fn calculate_availability(
    ctx: &AppContext,
    event_type_id: &str,
    start_date: &str,
    end_date: &str,
    timezone: &str,
) -> Result<Vec<TimeSlot>> {
    let event_type_id = parse_uuid("eventTypeId", event_type_id)?;
    let range_start = parse_date("startDate", start_date)?;
    let range_end = parse_date("endDate", end_date)?;
    let requester_tz = parse_timezone(timezone)?;

    let slots = ctx
        .slot_calculator
        .compute_slots(event_type_id, range_start, range_end, requester_tz)
        .await?;
    info!(%event_type_id, slot_count = slots.len(), "Availability computed");
    Ok(slots)
}

/// Compute bookable slots for a group event type (intersection of all
/// hosts' free time).
///
/// # Errors
/// Same taxonomy as [`calculate_availability`].
#[instrument(skip(ctx))]
pub async fn calculate_group_availability(
    ctx: &AppContext,
    group_event_type_id: &str,
    start_date: &str,
    end_date: &str,
    timezone: &str,
) -> Result<Vec<TimeSlot>> {
    let group_event_type_id = parse_uuid("groupEventTypeId", group_event_type_id)?;
    let range_start = parse_date("startDate", start_date)?;
    let range_end = parse_date("endDate", end_date)?;
    let requester_tz = parse_timezone(timezone)?;

    let slots = ctx
        .slot_calculator
        .compute_group_slots(group_event_type_id, range_start, range_end, requester_tz)
        .await?;
    info!(%group_event_type_id, slot_count = slots.len(), "Group availability computed");
    Ok(slots)
}

/// Resolve the event type behind a public booking link, for the booking
/// page. Inactive event types resolve as missing.
///
/// # Errors
/// `NotFound` for an unknown or inactive link.
#[instrument(skip(ctx))]
pub async fn resolve_booking_link(ctx: &AppContext, booking_link: &str) -> Result<EventType> {
    ctx.event_types
        .find_by_booking_link(booking_link)
        .await?
        .filter(|et| et.is_active)
        .ok_or_else(|| SchedulingError::NotFound(format!("booking link {booking_link} not found")))
}

/// Fetch a host's weekly availability rules, ordered by day and start time.
///
/// # Errors
/// `InvalidInput` for a malformed host id, `Database` on storage failure.
#[instrument(skip(ctx))]
pub async fn get_availability_rules(
    ctx: &AppContext,
    host_user_id: &str,
) -> Result<Vec<AvailabilityRule>> {
    let host_user_id = parse_uuid("hostUserId", host_user_id)?;
    ctx.availability.rules_for_host(host_user_id).await
}

/// Replace a host's weekly rule set wholesale. Last writer wins.
///
/// # Errors
/// `InvalidInput` for malformed ids, times, or rule windows.
#[instrument(skip(ctx, rules), fields(rule_count = rules.len()))]
pub async fn replace_availability_rules(
    ctx: &AppContext,
    host_user_id: &str,
    rules: Vec<AvailabilityRuleInput>,
) -> Result<()> {
    let host_user_id = parse_uuid("hostUserId", host_user_id)?;

    let rules = rules
        .into_iter()
        .map(|input| {
            Ok(AvailabilityRule {
                id: Uuid::new_v4(),
                host_user_id,
                day_of_week: input.day_of_week,
                start_time: parse_rule_time("startTime", &input.start_time)?,
                end_time: parse_rule_time("endTime", &input.end_time)?,
                is_available: input.is_available,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ctx.availability.replace_rules_for_host(host_user_id, rules).await?;
    info!(%host_user_id, "Availability rules replaced");
    Ok(())
}

fn parse_rule_time(field: &str, value: &str) -> Result<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        slotbook_domain::SchedulingError::InvalidInput(format!(
            "{field} is not a HH:MM wall-clock time: {value}"
        ))
    })
}
