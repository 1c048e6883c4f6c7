//! Booking transaction orchestration
//!
//! Validates input, builds atomic check parameters, and delegates the
//! check-then-insert to the ledger port. The advisory slot lock is a UX
//! optimization: losing it, or skipping it entirely, never fails a booking.
//! The atomic re-validation inside the ledger is the correctness mechanism.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use slotbook_domain::types::meeting::BookingOperation;
use slotbook_domain::{
    EventType, HostProfile, Meeting, MeetingStatus, NewParticipant, Result, SchedulingError,
    SlotLock,
};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::ports::{
    BookingInsert, BookingNotifier, Clock, ConflictCheck, DailyLimitCheck, EventTypeRepository,
    GroupBookingInsert, HostDirectory, HostParticipant, LimitScope, MeetingLedger,
    ParticipantTokenVerifier, SlotLockRepository,
};

/// Who is asking for a reschedule or cancellation.
///
/// Hosts are identified by session (an upstream yes/no gate resolves the
/// user id); participants present the opaque token from their confirmation
/// link.
#[derive(Debug, Clone)]
pub enum Actor {
    Host(Uuid),
    Participant { token: String },
}

/// Single-host booking request, as captured from the booking form.
#[derive(Debug, Clone)]
pub struct BookMeetingRequest {
    pub event_type_id: Uuid,
    pub host_user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub participant: NewParticipant,
    /// Requester timezone, recorded on the meeting row as a display hint.
    pub timezone: String,
    pub lock_id: Option<String>,
}

/// Group booking request.
#[derive(Debug, Clone)]
pub struct BookGroupMeetingRequest {
    pub group_event_type_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub participant: NewParticipant,
    pub timezone: String,
}

/// Booking transaction manager.
pub struct BookingService {
    event_types: Arc<dyn EventTypeRepository>,
    hosts: Arc<dyn HostDirectory>,
    ledger: Arc<dyn MeetingLedger>,
    locks: Arc<dyn SlotLockRepository>,
    tokens: Arc<dyn ParticipantTokenVerifier>,
    notifier: Arc<dyn BookingNotifier>,
    clock: Arc<dyn Clock>,
    lock_ttl: Duration,
}

impl BookingService {
    /// Create a new booking service over the given ports.
    pub fn new(
        event_types: Arc<dyn EventTypeRepository>,
        hosts: Arc<dyn HostDirectory>,
        ledger: Arc<dyn MeetingLedger>,
        locks: Arc<dyn SlotLockRepository>,
        tokens: Arc<dyn ParticipantTokenVerifier>,
        notifier: Arc<dyn BookingNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            event_types,
            hosts,
            ledger,
            locks,
            tokens,
            notifier,
            clock,
            lock_ttl: Duration::seconds(slotbook_domain::constants::SLOT_LOCK_TTL_SECS),
        }
    }

    /// Override the advisory lock TTL.
    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Best-effort advisory reservation of a slot during the booking form
    /// flow. Returns whether the lock was accepted.
    ///
    /// Failure to lock is not fatal: callers proceed to `book_meeting`,
    /// where the atomic re-validation decides.
    #[instrument(skip(self), fields(%host_user_id, %event_type_id, lock_id))]
    pub async fn lock_slot(
        &self,
        host_user_id: Uuid,
        event_type_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        lock_id: String,
    ) -> bool {
        let now = self.clock.now_utc();

        // Opportunistic cleanup keeps expired locks from piling up.
        if let Err(err) = self.locks.purge_expired(now).await {
            warn!(error = %err, "failed to purge expired slot locks");
        }

        let lock = SlotLock {
            lock_id,
            user_id: host_user_id,
            event_type_id,
            start_time: start,
            end_time: end,
            expires_at: now + self.lock_ttl,
        };

        match self.locks.acquire(lock).await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "slot lock failed; continuing without advisory lock");
                false
            }
        }
    }

    /// Book a single-host meeting.
    ///
    /// The overlap, minimum-notice and daily-limit checks all re-run inside
    /// the ledger transaction; two concurrent calls for overlapping slots
    /// end with exactly one success and one `SlotConflict`.
    #[instrument(skip(self, request), fields(event_type_id = %request.event_type_id))]
    pub async fn book_meeting(&self, request: BookMeetingRequest) -> Result<Uuid> {
        let booker = request.participant.normalized()?;

        let event_type = self.load_active_event_type(request.event_type_id).await?;
        if event_type.host_user_id != request.host_user_id {
            return Err(SchedulingError::InvalidInput(format!(
                "event type {} does not belong to host {}",
                event_type.id, request.host_user_id
            )));
        }

        let host = self.load_host(event_type.host_user_id).await?;
        let end = request.start_time
            + Duration::minutes(i64::from(event_type.duration_minutes));

        let check = self.conflict_check(
            &event_type,
            &host,
            request.start_time,
            end,
            LimitScope::EventType(event_type.id),
            None,
        )?;
        // Fail fast on notice before opening a transaction; the ledger
        // enforces the same bound atomically.
        if request.start_time < check.not_before {
            return Err(SchedulingError::NoticeViolation(format!(
                "slot starts before the {}h minimum notice window",
                event_type.minimum_notice_hours
            )));
        }

        let insert = BookingInsert {
            event_type_id: event_type.id,
            host_user_id: host.user_id,
            start: request.start_time,
            end,
            timezone: request.timezone,
            host: host_participant(&host),
            booker,
            check,
            lock_id: request.lock_id,
        };

        let meeting_id = self.ledger.book(insert).await?;
        debug!(%meeting_id, "meeting booked");

        self.dispatch(meeting_id, BookingOperation::Booked);
        Ok(meeting_id)
    }

    /// Book a group meeting: every host's ledger is re-validated inside one
    /// transaction, and a host participant row is created per host.
    #[instrument(skip(self, request), fields(group_event_type_id = %request.group_event_type_id))]
    pub async fn book_group_meeting(&self, request: BookGroupMeetingRequest) -> Result<Uuid> {
        let booker = request.participant.normalized()?;

        let group = self
            .event_types
            .find_group_event_type(request.group_event_type_id)
            .await?
            .filter(|g| g.is_active)
            .ok_or_else(|| {
                SchedulingError::NotFound(format!(
                    "group event type {} not found",
                    request.group_event_type_id
                ))
            })?;
        group.validate()?;

        let end = request.start_time + Duration::minutes(i64::from(group.duration_minutes));

        let mut hosts = Vec::with_capacity(group.host_user_ids.len());
        for &host_id in &group.host_user_ids {
            let host = self.load_host(host_id).await?;
            let view = group.as_host_event_type(host_id);
            let check = self.conflict_check(
                &view,
                &host,
                request.start_time,
                end,
                LimitScope::Group(group.id),
                None,
            )?;
            if request.start_time < check.not_before {
                return Err(SchedulingError::NoticeViolation(format!(
                    "slot starts before the {}h minimum notice window",
                    group.minimum_notice_hours
                )));
            }
            hosts.push((host_participant(&host), check));
        }

        let insert = GroupBookingInsert {
            group_event_type_id: group.id,
            start: request.start_time,
            end,
            timezone: request.timezone,
            hosts,
            booker,
        };

        let meeting_id = self.ledger.book_group(insert).await?;
        debug!(%meeting_id, "group meeting booked");

        self.dispatch(meeting_id, BookingOperation::Booked);
        Ok(meeting_id)
    }

    /// Move a meeting to a new start time, keeping its status.
    ///
    /// The meeting's own current slot is excluded from the conflict scan so
    /// adjacent-in-place moves succeed. Group meetings re-validate every
    /// host's calendar, the same checks the original group booking passed.
    #[instrument(skip(self, actor), fields(%meeting_id))]
    pub async fn reschedule_meeting(
        &self,
        meeting_id: Uuid,
        new_start: DateTime<Utc>,
        actor: Actor,
    ) -> Result<()> {
        let meeting = self.load_meeting(meeting_id).await?;
        self.authorize(&meeting, &actor).await?;

        if meeting.status.is_terminal() {
            return Err(SchedulingError::InvalidState(format!(
                "cannot reschedule a {} meeting",
                meeting.status.as_str()
            )));
        }

        let (new_end, checks) = self.reschedule_checks(&meeting, new_start).await?;
        self.ledger.reschedule(meeting_id, new_start, new_end, checks).await?;
        debug!(%meeting_id, "meeting rescheduled");

        self.dispatch(meeting_id, BookingOperation::Rescheduled);
        Ok(())
    }

    /// Cancel a meeting. Idempotent: cancelling an already-cancelled meeting
    /// returns success and mutates nothing. `Completed` meetings reject with
    /// `InvalidState`. Start/end times are never altered.
    #[instrument(skip(self, actor), fields(%meeting_id))]
    pub async fn cancel_meeting(&self, meeting_id: Uuid, actor: Actor) -> Result<()> {
        let meeting = self.load_meeting(meeting_id).await?;
        self.authorize(&meeting, &actor).await?;

        match meeting.status {
            MeetingStatus::Cancelled => return Ok(()),
            MeetingStatus::Completed => {
                return Err(SchedulingError::InvalidState(
                    "cannot cancel a completed meeting".into(),
                ));
            }
            MeetingStatus::Pending | MeetingStatus::Confirmed => {}
        }

        let newly_cancelled = self.ledger.cancel(meeting_id).await?;
        if newly_cancelled {
            debug!(%meeting_id, "meeting cancelled");
            self.dispatch(meeting_id, BookingOperation::Cancelled);
        }
        Ok(())
    }

    /// Build the atomic check parameters for one host.
    fn conflict_check(
        &self,
        constraints: &EventType,
        host: &HostProfile,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: LimitScope,
        exclude_meeting: Option<Uuid>,
    ) -> Result<ConflictCheck> {
        let now = self.clock.now_utc();
        let not_before = now + Duration::hours(i64::from(constraints.minimum_notice_hours));

        let daily_limit = match constraints.daily_limit {
            Some(limit) => Some(self.daily_limit_check(host, start, limit, scope)?),
            None => None,
        };

        Ok(ConflictCheck {
            host_user_id: host.user_id,
            start,
            end,
            buffer_before_minutes: constraints.buffer_before_minutes,
            buffer_after_minutes: constraints.buffer_after_minutes,
            not_before,
            daily_limit,
            exclude_meeting,
        })
    }

    /// UTC bounds of the host-local calendar day containing `start`.
    fn daily_limit_check(
        &self,
        host: &HostProfile,
        start: DateTime<Utc>,
        limit: u32,
        scope: LimitScope,
    ) -> Result<DailyLimitCheck> {
        let tz: Tz = host.timezone.parse().map_err(|_| {
            SchedulingError::Internal(format!(
                "host {} has invalid timezone {:?}",
                host.user_id, host.timezone
            ))
        })?;

        let local_day = start.with_timezone(&tz).date_naive();
        let day_start = tz
            .from_local_datetime(&local_day.and_hms_opt(0, 0, 0).ok_or_else(|| {
                SchedulingError::Internal("midnight construction failed".into())
            })?)
            .earliest()
            .ok_or_else(|| {
                SchedulingError::Internal(format!("no midnight in {tz} on {local_day}"))
            })?
            .with_timezone(&Utc);

        Ok(DailyLimitCheck { limit, scope, day_start, day_end: day_start + Duration::days(1) })
    }

    async fn authorize(&self, meeting: &Meeting, actor: &Actor) -> Result<()> {
        match actor {
            Actor::Host(user_id) if *user_id == meeting.host_user_id => Ok(()),
            Actor::Host(user_id) => Err(SchedulingError::Unauthorized(format!(
                "user {user_id} is not the host of meeting {}",
                meeting.id
            ))),
            Actor::Participant { token } => {
                if self.tokens.verify(meeting.id, token).await? {
                    Ok(())
                } else {
                    Err(SchedulingError::Unauthorized(format!(
                        "invalid participant token for meeting {}",
                        meeting.id
                    )))
                }
            }
        }
    }

    /// Re-resolve the constraints a meeting was booked under and build the
    /// atomic checks for its new slot: one for a solo meeting, one per group
    /// host otherwise, each excluding the meeting's own current slot.
    async fn reschedule_checks(
        &self,
        meeting: &Meeting,
        new_start: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, Vec<ConflictCheck>)> {
        if let Some(event_type_id) = meeting.event_type_id {
            let event_type = self.load_active_event_type(event_type_id).await?;
            let host = self.load_host(meeting.host_user_id).await?;
            let new_end = new_start + Duration::minutes(i64::from(event_type.duration_minutes));
            let check = self.conflict_check(
                &event_type,
                &host,
                new_start,
                new_end,
                LimitScope::EventType(event_type.id),
                Some(meeting.id),
            )?;
            if new_start < check.not_before {
                return Err(SchedulingError::NoticeViolation(format!(
                    "new slot starts before the {}h minimum notice window",
                    event_type.minimum_notice_hours
                )));
            }
            return Ok((new_end, vec![check]));
        }

        if let Some(group_id) = meeting.group_event_type_id {
            let group = self
                .event_types
                .find_group_event_type(group_id)
                .await?
                .filter(|g| g.is_active)
                .ok_or_else(|| {
                    SchedulingError::NotFound(format!("group event type {group_id} not found"))
                })?;
            let new_end = new_start + Duration::minutes(i64::from(group.duration_minutes));

            let mut checks = Vec::with_capacity(group.host_user_ids.len());
            for &host_id in &group.host_user_ids {
                let host = self.load_host(host_id).await?;
                let view = group.as_host_event_type(host_id);
                let check = self.conflict_check(
                    &view,
                    &host,
                    new_start,
                    new_end,
                    LimitScope::Group(group.id),
                    Some(meeting.id),
                )?;
                if new_start < check.not_before {
                    return Err(SchedulingError::NoticeViolation(format!(
                        "new slot starts before the {}h minimum notice window",
                        group.minimum_notice_hours
                    )));
                }
                checks.push(check);
            }
            return Ok((new_end, checks));
        }

        Err(SchedulingError::Internal(format!(
            "meeting {} references neither an event type nor a group",
            meeting.id
        )))
    }

    async fn load_active_event_type(&self, id: Uuid) -> Result<EventType> {
        self.event_types
            .find_event_type(id)
            .await?
            .filter(|et| et.is_active)
            .ok_or_else(|| SchedulingError::NotFound(format!("event type {id} not found")))
    }

    async fn load_host(&self, user_id: Uuid) -> Result<HostProfile> {
        self.hosts
            .find_host(user_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("host {user_id} not found")))
    }

    async fn load_meeting(&self, meeting_id: Uuid) -> Result<Meeting> {
        self.ledger
            .find_meeting(meeting_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("meeting {meeting_id} not found")))
    }

    /// Fire the post-commit notification on a background task, so callers
    /// return as soon as the ledger commits. Failures are logged and
    /// swallowed; the booking decision already stands.
    fn dispatch(&self, meeting_id: Uuid, operation: BookingOperation) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(meeting_id, operation).await {
                error!(%meeting_id, operation = operation.as_str(), error = %err,
                    "notification dispatch failed after committed booking operation");
            }
        });
    }
}

fn host_participant(host: &HostProfile) -> HostParticipant {
    HostParticipant {
        user_id: host.user_id,
        name: host.display_name.clone().unwrap_or_else(|| host.username.clone()),
        email: host.email.clone(),
    }
}
