//! Slot calculation service
//!
//! Projects a host's recurring availability rules, the booking ledger and
//! the event type's constraints into an ordered list of bookable slots.
//! Group variants intersect per-host free intervals before slicing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use slotbook_domain::constants::MAX_BOOKING_HORIZON_DAYS;
use slotbook_domain::{
    EventType, HostProfile, Meeting, MeetingStatus, Result, SchedulingError, TimeSlot,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::intervals::{self, Interval};
use super::ports::{
    AvailabilityRepository, Clock, EventTypeRepository, HostDirectory, MeetingLedger,
};

/// Availability resolution service.
///
/// Reads are not transactionally consistent with concurrent bookings by
/// design: computed slots are a hint, and the booking transaction is the
/// source of truth.
pub struct SlotCalculator {
    event_types: Arc<dyn EventTypeRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    hosts: Arc<dyn HostDirectory>,
    ledger: Arc<dyn MeetingLedger>,
    clock: Arc<dyn Clock>,
    max_horizon_days: i64,
}

impl SlotCalculator {
    /// Create a new slot calculator over the given ports.
    pub fn new(
        event_types: Arc<dyn EventTypeRepository>,
        availability: Arc<dyn AvailabilityRepository>,
        hosts: Arc<dyn HostDirectory>,
        ledger: Arc<dyn MeetingLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            event_types,
            availability,
            hosts,
            ledger,
            clock,
            max_horizon_days: MAX_BOOKING_HORIZON_DAYS,
        }
    }

    /// Override the booking horizon (days forward from now).
    pub fn with_max_horizon_days(mut self, days: i64) -> Self {
        self.max_horizon_days = days;
        self
    }

    /// Compute bookable slots for a single-host event type over a date
    /// range, rendered in the requester's timezone.
    ///
    /// # Errors
    /// `NotFound` for a missing or inactive event type or missing host,
    /// `InvalidRange` for an inverted or over-horizon range.
    #[instrument(skip(self), fields(%event_type_id))]
    pub async fn compute_slots(
        &self,
        event_type_id: Uuid,
        range_start: NaiveDate,
        range_end: NaiveDate,
        requester_tz: Tz,
    ) -> Result<Vec<TimeSlot>> {
        let now = self.clock.now_utc();
        self.validate_range(range_start, range_end, now)?;

        let event_type = self
            .event_types
            .find_event_type(event_type_id)
            .await?
            .filter(|et| et.is_active)
            .ok_or_else(|| {
                SchedulingError::NotFound(format!("event type {event_type_id} not found"))
            })?;

        let host = self.find_host(event_type.host_user_id).await?;
        let host_tz = parse_host_tz(&host)?;
        let not_before = now + Duration::hours(i64::from(event_type.minimum_notice_hours));

        let windows = self.projected_windows(&host, host_tz, range_start, range_end).await?;
        let (busy, meetings) = self.buffered_busy(&event_type, &host, &windows).await?;

        // Candidate slots stay phase-anchored to the availability window:
        // slice the window, then drop candidates touching buffered busy time
        // or the notice cutoff.
        let duration = Duration::minutes(i64::from(event_type.duration_minutes));
        let mut slots: Vec<Interval> = windows
            .iter()
            .flat_map(|iv| intervals::slice(iv, duration))
            .filter(|slot| !busy.iter().any(|b| b.start < slot.end && b.end > slot.start))
            .filter(|slot| slot.start >= not_before)
            .collect();

        if let Some(limit) = event_type.daily_limit {
            slots = cap_per_local_day(slots, limit, host_tz, &meetings, |m| {
                m.event_type_id == Some(event_type.id)
            });
        }

        debug!(count = slots.len(), "computed bookable slots");

        Ok(render_slots(&slots, requester_tz))
    }

    /// Compute bookable slots for a group event type: the intersection of
    /// every host's free time, sliced into slots of the group's duration.
    ///
    /// Unlike the single-host path, slots are sliced from the intersection
    /// rather than the availability windows, so after a meeting they resume
    /// at the free boundary instead of the next window-phase boundary.
    ///
    /// Zero overlap for a day yields zero slots for that day, not an error.
    #[instrument(skip(self), fields(%group_event_type_id))]
    pub async fn compute_group_slots(
        &self,
        group_event_type_id: Uuid,
        range_start: NaiveDate,
        range_end: NaiveDate,
        requester_tz: Tz,
    ) -> Result<Vec<TimeSlot>> {
        let now = self.clock.now_utc();
        self.validate_range(range_start, range_end, now)?;

        let group = self
            .event_types
            .find_group_event_type(group_event_type_id)
            .await?
            .filter(|g| g.is_active)
            .ok_or_else(|| {
                SchedulingError::NotFound(format!(
                    "group event type {group_event_type_id} not found"
                ))
            })?;
        group.validate()?;

        let not_before = now + Duration::hours(i64::from(group.minimum_notice_hours));

        // Buffers and minimum notice apply per host, before intersection.
        let mut intersection: Option<Vec<Interval>> = None;
        let mut primary: Option<(Tz, Vec<Meeting>)> = None;

        for &host_id in &group.host_user_ids {
            let host = self.find_host(host_id).await?;
            let host_tz = parse_host_tz(&host)?;
            let view = group.as_host_event_type(host_id);

            let windows = self.projected_windows(&host, host_tz, range_start, range_end).await?;
            let (busy, meetings) = self.buffered_busy(&view, &host, &windows).await?;
            let free = intervals::subtract(&windows, &busy);
            let free = intervals::clip_before(&free, not_before);

            if primary.is_none() {
                primary = Some((host_tz, meetings));
            }

            intersection = Some(match intersection {
                None => free,
                Some(acc) => intervals::intersect(&acc, &free),
            });

            if intersection.as_ref().is_some_and(Vec::is_empty) {
                break;
            }
        }

        let intersection = intersection.unwrap_or_default();
        let duration = Duration::minutes(i64::from(group.duration_minutes));
        let mut slots: Vec<Interval> =
            intersection.iter().flat_map(|iv| intervals::slice(iv, duration)).collect();

        // Daily cap buckets by the primary host's calendar day.
        if let (Some(limit), Some((primary_tz, primary_meetings))) =
            (group.daily_limit, primary.as_ref())
        {
            slots = cap_per_local_day(slots, limit, *primary_tz, primary_meetings, |m| {
                m.group_event_type_id == Some(group.id)
            });
        }

        debug!(count = slots.len(), hosts = group.host_user_ids.len(), "computed group slots");

        Ok(render_slots(&slots, requester_tz))
    }

    /// Project availability rules into normalized UTC windows, one interval
    /// per rule occurrence over the date range.
    async fn projected_windows(
        &self,
        host: &HostProfile,
        host_tz: Tz,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<Interval>> {
        let rules = self.availability.rules_for_host(host.user_id).await?;

        let mut by_weekday: HashMap<u8, Vec<&slotbook_domain::AvailabilityRule>> = HashMap::new();
        for rule in rules.iter().filter(|r| r.is_available) {
            by_weekday.entry(rule.day_of_week).or_default().push(rule);
        }

        let mut free = Vec::new();
        let mut date = range_start;
        while date <= range_end {
            let weekday = u8::try_from(date.weekday().num_days_from_sunday())
                .map_err(|_| SchedulingError::Internal("weekday out of range".into()))?;
            if let Some(day_rules) = by_weekday.get(&weekday) {
                for rule in day_rules {
                    let start = project_local(host_tz, date, rule.start_time);
                    let end = project_local(host_tz, date, rule.end_time);
                    match (start, end) {
                        (Some(s), Some(e)) if s < e => free.push(Interval { start: s, end: e }),
                        _ => {
                            // DST gap swallowed this window for the day
                            debug!(%date, rule_id = %rule.id, "skipping rule lost to DST transition");
                        }
                    }
                }
            }
            date = date.succ_opt().ok_or_else(|| {
                SchedulingError::InvalidRange("date range overflows the calendar".into())
            })?;
        }

        Ok(intervals::normalize(free))
    }

    /// Fetch the host's ledger over a padded window and expand each
    /// non-cancelled meeting by the event type's buffers. Also returns the
    /// raw meetings, for daily-limit accounting.
    async fn buffered_busy(
        &self,
        event_type: &EventType,
        host: &HostProfile,
        windows: &[Interval],
    ) -> Result<(Vec<Interval>, Vec<Meeting>)> {
        if windows.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        // Pad the query so meetings whose buffers reach into the windows are
        // included.
        let pad = Duration::minutes(i64::from(
            event_type.buffer_before_minutes.max(event_type.buffer_after_minutes),
        )) + Duration::days(1);
        let window_start = windows[0].start - pad;
        let window_end = windows[windows.len() - 1].end + pad;

        let meetings =
            self.ledger.meetings_in_range(host.user_id, window_start, window_end).await?;

        let busy: Vec<Interval> = meetings
            .iter()
            .filter(|m| !matches!(m.status, MeetingStatus::Cancelled))
            .map(|m| Interval {
                start: m.start_time
                    - Duration::minutes(i64::from(event_type.buffer_before_minutes)),
                end: m.end_time + Duration::minutes(i64::from(event_type.buffer_after_minutes)),
            })
            .collect();
        let busy = intervals::normalize(busy);

        Ok((busy, meetings))
    }

    async fn find_host(&self, user_id: Uuid) -> Result<HostProfile> {
        self.hosts
            .find_host(user_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("host {user_id} not found")))
    }

    fn validate_range(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if range_start > range_end {
            return Err(SchedulingError::InvalidRange(format!(
                "start date {range_start} is after end date {range_end}"
            )));
        }
        let horizon = now.date_naive() + Duration::days(self.max_horizon_days);
        if range_end > horizon {
            return Err(SchedulingError::InvalidRange(format!(
                "end date {range_end} is beyond the {}-day booking horizon",
                self.max_horizon_days
            )));
        }
        Ok(())
    }
}

/// Resolve a host-local wall-clock time on a date to a UTC instant.
///
/// Ambiguous times (fall-back) take the earlier mapping; nonexistent times
/// (spring-forward gap) yield `None`.
fn project_local(tz: Tz, date: NaiveDate, time: chrono::NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time)).earliest().map(|dt| dt.with_timezone(&Utc))
}

fn parse_host_tz(host: &HostProfile) -> Result<Tz> {
    host.timezone.parse::<Tz>().map_err(|_| {
        SchedulingError::Internal(format!(
            "host {} has invalid timezone {:?}",
            host.user_id, host.timezone
        ))
    })
}

/// Cap the slots emitted per host-local calendar day, earliest first,
/// leaving room for meetings already booked that day.
fn cap_per_local_day(
    slots: Vec<Interval>,
    limit: u32,
    tz: Tz,
    meetings: &[Meeting],
    counts_against_limit: impl Fn(&Meeting) -> bool,
) -> Vec<Interval> {
    let mut booked: HashMap<NaiveDate, u32> = HashMap::new();
    for meeting in meetings {
        if !matches!(meeting.status, MeetingStatus::Cancelled) && counts_against_limit(meeting) {
            let day = meeting.start_time.with_timezone(&tz).date_naive();
            *booked.entry(day).or_insert(0) += 1;
        }
    }

    let mut emitted: HashMap<NaiveDate, u32> = HashMap::new();
    slots
        .into_iter()
        .filter(|slot| {
            let day = slot.start.with_timezone(&tz).date_naive();
            let allowed = limit.saturating_sub(booked.get(&day).copied().unwrap_or(0));
            let seen = emitted.entry(day).or_insert(0);
            if *seen < allowed {
                *seen += 1;
                true
            } else {
                false
            }
        })
        .collect()
}

/// Render UTC slot intervals into the wire shape, ascending by start.
fn render_slots(slots: &[Interval], requester_tz: Tz) -> Vec<TimeSlot> {
    let mut slots: Vec<&Interval> = slots.iter().collect();
    slots.sort_by_key(|iv| iv.start);
    slots
        .into_iter()
        .map(|iv| TimeSlot {
            slot_start: iv.start,
            slot_end: iv.end,
            slot_start_local: iv.start.with_timezone(&requester_tz).to_rfc3339(),
            slot_end_local: iv.end.with_timezone(&requester_tz).to_rfc3339(),
        })
        .collect()
}
