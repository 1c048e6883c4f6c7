//! Mock port implementations for testing
//!
//! In-memory stands-ins for every scheduling port, enabling deterministic
//! tests without database dependencies. The mock ledger honours the same
//! check-then-insert contract as the real one, so conflict, notice and
//! daily-limit paths are exercised end to end.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use slotbook_core::{
    AvailabilityRepository, BookingInsert, BookingNotifier, Clock, ConflictCheck,
    EventTypeRepository, GroupBookingInsert, HostDirectory, LimitScope, MeetingLedger,
    ParticipantTokenVerifier, SlotLockRepository,
};
use slotbook_domain::types::meeting::BookingOperation;
use slotbook_domain::{
    AvailabilityRule, EventType, GroupEventType, HostProfile, Meeting, MeetingParticipant,
    MeetingStatus, Result as DomainResult, SchedulingError, SlotLock,
};
use uuid::Uuid;

/// Clock pinned to a fixed instant, adjustable mid-test.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-memory mock for `AvailabilityRepository`.
#[derive(Default)]
pub struct InMemoryAvailability {
    rules: Mutex<Vec<AvailabilityRule>>,
}

impl InMemoryAvailability {
    pub fn add(&self, rule: AvailabilityRule) {
        self.rules.lock().unwrap().push(rule);
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryAvailability {
    async fn rules_for_host(&self, host_user_id: Uuid) -> DomainResult<Vec<AvailabilityRule>> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.host_user_id == host_user_id)
            .cloned()
            .collect())
    }

    async fn replace_rules_for_host(
        &self,
        host_user_id: Uuid,
        rules: Vec<AvailabilityRule>,
    ) -> DomainResult<()> {
        let mut guard = self.rules.lock().unwrap();
        guard.retain(|r| r.host_user_id != host_user_id);
        guard.extend(rules);
        Ok(())
    }
}

/// In-memory mock for `EventTypeRepository`.
#[derive(Default)]
pub struct InMemoryEventTypes {
    event_types: Mutex<Vec<EventType>>,
    groups: Mutex<Vec<GroupEventType>>,
}

impl InMemoryEventTypes {
    pub fn add(&self, event_type: EventType) {
        self.event_types.lock().unwrap().push(event_type);
    }

    pub fn add_group(&self, group: GroupEventType) {
        self.groups.lock().unwrap().push(group);
    }
}

#[async_trait]
impl EventTypeRepository for InMemoryEventTypes {
    async fn find_event_type(&self, id: Uuid) -> DomainResult<Option<EventType>> {
        Ok(self.event_types.lock().unwrap().iter().find(|et| et.id == id).cloned())
    }

    async fn find_by_booking_link(&self, booking_link: &str) -> DomainResult<Option<EventType>> {
        Ok(self
            .event_types
            .lock()
            .unwrap()
            .iter()
            .find(|et| et.booking_link == booking_link)
            .cloned())
    }

    async fn find_group_event_type(&self, id: Uuid) -> DomainResult<Option<GroupEventType>> {
        Ok(self.groups.lock().unwrap().iter().find(|g| g.id == id).cloned())
    }
}

/// In-memory mock for `HostDirectory`.
#[derive(Default)]
pub struct InMemoryHosts {
    hosts: Mutex<HashMap<Uuid, HostProfile>>,
}

impl InMemoryHosts {
    pub fn add(&self, host: HostProfile) {
        self.hosts.lock().unwrap().insert(host.user_id, host);
    }
}

#[async_trait]
impl HostDirectory for InMemoryHosts {
    async fn find_host(&self, user_id: Uuid) -> DomainResult<Option<HostProfile>> {
        Ok(self.hosts.lock().unwrap().get(&user_id).cloned())
    }
}

#[derive(Default)]
struct LedgerState {
    meetings: Vec<Meeting>,
    participants: Vec<MeetingParticipant>,
}

impl LedgerState {
    /// Meetings occupying a host's calendar: meetings they own plus group
    /// meetings they appear in as a host participant.
    fn host_meetings(&self, host_user_id: Uuid) -> Vec<&Meeting> {
        self.meetings
            .iter()
            .filter(|m| {
                m.host_user_id == host_user_id
                    || self.participants.iter().any(|p| {
                        p.meeting_id == m.id && p.is_host && p.user_id == Some(host_user_id)
                    })
            })
            .collect()
    }

    fn apply_check(&self, check: &ConflictCheck) -> DomainResult<()> {
        if check.start < check.not_before {
            return Err(SchedulingError::NoticeViolation(
                "slot starts inside the minimum notice window".into(),
            ));
        }

        let before = Duration::minutes(i64::from(check.buffer_before_minutes));
        let after = Duration::minutes(i64::from(check.buffer_after_minutes));
        let conflict = self.host_meetings(check.host_user_id).into_iter().any(|m| {
            m.status != MeetingStatus::Cancelled
                && Some(m.id) != check.exclude_meeting
                && m.start_time - before < check.end
                && m.end_time + after > check.start
        });
        if conflict {
            return Err(SchedulingError::SlotConflict(
                "slot overlaps an existing meeting".into(),
            ));
        }

        if let Some(limit) = &check.daily_limit {
            let booked = self
                .host_meetings(check.host_user_id)
                .into_iter()
                .filter(|m| {
                    m.status != MeetingStatus::Cancelled
                        && Some(m.id) != check.exclude_meeting
                        && m.start_time >= limit.day_start
                        && m.start_time < limit.day_end
                        && match limit.scope {
                            LimitScope::EventType(id) => m.event_type_id == Some(id),
                            LimitScope::Group(id) => m.group_event_type_id == Some(id),
                        }
                })
                .count();
            if booked as u32 >= limit.limit {
                return Err(SchedulingError::DailyLimitExceeded(format!(
                    "daily limit of {} reached",
                    limit.limit
                )));
            }
        }

        Ok(())
    }
}

/// In-memory mock for `MeetingLedger`.
///
/// One mutex guards both meetings and participants, so each operation is
/// atomic the way the real transaction is.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    consumed_locks: Mutex<Vec<String>>,
}

impl InMemoryLedger {
    /// Seed a pre-existing meeting directly, bypassing checks.
    pub fn add_meeting(&self, meeting: Meeting) {
        self.state.lock().unwrap().meetings.push(meeting);
    }

    pub fn add_participant(&self, participant: MeetingParticipant) {
        self.state.lock().unwrap().participants.push(participant);
    }

    pub fn participants_of(&self, meeting_id: Uuid) -> Vec<MeetingParticipant> {
        self.state
            .lock()
            .unwrap()
            .participants
            .iter()
            .filter(|p| p.meeting_id == meeting_id)
            .cloned()
            .collect()
    }

    pub fn consumed_locks(&self) -> Vec<String> {
        self.consumed_locks.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeetingLedger for InMemoryLedger {
    async fn meetings_in_range(
        &self,
        host_user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Meeting>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .host_meetings(host_user_id)
            .into_iter()
            .filter(|m| m.status != MeetingStatus::Cancelled)
            .filter(|m| m.start_time < end && m.end_time > start)
            .cloned()
            .collect())
    }

    async fn find_meeting(&self, meeting_id: Uuid) -> DomainResult<Option<Meeting>> {
        Ok(self.state.lock().unwrap().meetings.iter().find(|m| m.id == meeting_id).cloned())
    }

    async fn book(&self, insert: BookingInsert) -> DomainResult<Uuid> {
        let mut state = self.state.lock().unwrap();
        state.apply_check(&insert.check)?;

        let meeting_id = Uuid::new_v4();
        state.meetings.push(Meeting {
            id: meeting_id,
            event_type_id: Some(insert.event_type_id),
            group_event_type_id: None,
            host_user_id: insert.host_user_id,
            start_time: insert.start,
            end_time: insert.end,
            timezone: insert.timezone,
            status: MeetingStatus::Confirmed,
            calendar_event_id: None,
            calendar_provider: None,
        });
        state.participants.push(MeetingParticipant {
            meeting_id,
            user_id: Some(insert.host.user_id),
            name: insert.host.name,
            email: insert.host.email,
            is_host: true,
            notes: None,
        });
        state.participants.push(MeetingParticipant {
            meeting_id,
            user_id: None,
            name: insert.booker.name,
            email: insert.booker.email,
            is_host: false,
            notes: insert.booker.notes,
        });
        drop(state);

        if let Some(lock_id) = insert.lock_id {
            self.consumed_locks.lock().unwrap().push(lock_id);
        }
        Ok(meeting_id)
    }

    async fn book_group(&self, insert: GroupBookingInsert) -> DomainResult<Uuid> {
        let mut state = self.state.lock().unwrap();
        for (_, check) in &insert.hosts {
            state.apply_check(check)?;
        }

        let primary = insert.hosts.first().ok_or_else(|| {
            SchedulingError::InvalidInput("group booking requires at least one host".into())
        })?;
        let meeting_id = Uuid::new_v4();
        state.meetings.push(Meeting {
            id: meeting_id,
            event_type_id: None,
            group_event_type_id: Some(insert.group_event_type_id),
            host_user_id: primary.0.user_id,
            start_time: insert.start,
            end_time: insert.end,
            timezone: insert.timezone,
            status: MeetingStatus::Confirmed,
            calendar_event_id: None,
            calendar_provider: None,
        });
        for (host, _) in &insert.hosts {
            state.participants.push(MeetingParticipant {
                meeting_id,
                user_id: Some(host.user_id),
                name: host.name.clone(),
                email: host.email.clone(),
                is_host: true,
                notes: None,
            });
        }
        state.participants.push(MeetingParticipant {
            meeting_id,
            user_id: None,
            name: insert.booker.name,
            email: insert.booker.email,
            is_host: false,
            notes: insert.booker.notes,
        });
        Ok(meeting_id)
    }

    async fn reschedule(
        &self,
        meeting_id: Uuid,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        checks: Vec<ConflictCheck>,
    ) -> DomainResult<()> {
        let mut state = self.state.lock().unwrap();
        for check in &checks {
            state.apply_check(check)?;
        }

        let meeting = state
            .meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or_else(|| SchedulingError::NotFound(format!("meeting {meeting_id} not found")))?;
        meeting.start_time = new_start;
        meeting.end_time = new_end;
        Ok(())
    }

    async fn cancel(&self, meeting_id: Uuid) -> DomainResult<bool> {
        let mut state = self.state.lock().unwrap();
        let meeting = state
            .meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or_else(|| SchedulingError::NotFound(format!("meeting {meeting_id} not found")))?;
        if meeting.status == MeetingStatus::Cancelled {
            return Ok(false);
        }
        meeting.status = MeetingStatus::Cancelled;
        Ok(true)
    }
}

/// In-memory mock for `SlotLockRepository`.
#[derive(Default)]
pub struct InMemoryLocks {
    locks: Mutex<Vec<SlotLock>>,
    fail_acquire: Mutex<bool>,
}

impl InMemoryLocks {
    pub fn fail_next_acquire(&self) {
        *self.fail_acquire.lock().unwrap() = true;
    }

    pub fn live_count(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

#[async_trait]
impl SlotLockRepository for InMemoryLocks {
    async fn acquire(&self, lock: SlotLock) -> DomainResult<bool> {
        if std::mem::take(&mut *self.fail_acquire.lock().unwrap()) {
            return Err(SchedulingError::Database("lock table unavailable".into()));
        }
        let mut locks = self.locks.lock().unwrap();
        let taken = locks.iter().any(|l| {
            l.user_id == lock.user_id
                && l.start_time < lock.end_time
                && l.end_time > lock.start_time
        });
        if taken {
            return Ok(false);
        }
        locks.push(lock);
        Ok(true)
    }

    async fn consume(&self, lock_id: &str) -> DomainResult<bool> {
        let mut locks = self.locks.lock().unwrap();
        let before = locks.len();
        locks.retain(|l| l.lock_id != lock_id);
        Ok(locks.len() < before)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut locks = self.locks.lock().unwrap();
        let before = locks.len();
        locks.retain(|l| l.expires_at > now);
        Ok(before - locks.len())
    }
}

/// In-memory mock for `ParticipantTokenVerifier`.
#[derive(Default)]
pub struct InMemoryTokens {
    tokens: Mutex<HashMap<Uuid, String>>,
}

impl InMemoryTokens {
    pub fn issue(&self, meeting_id: Uuid, token: &str) {
        self.tokens.lock().unwrap().insert(meeting_id, token.to_string());
    }
}

#[async_trait]
impl ParticipantTokenVerifier for InMemoryTokens {
    async fn verify(&self, meeting_id: Uuid, token: &str) -> DomainResult<bool> {
        Ok(self.tokens.lock().unwrap().get(&meeting_id).is_some_and(|t| t == token))
    }
}

/// Notifier that records dispatches, optionally failing or never resolving.
#[derive(Default)]
pub struct RecordingNotifier {
    dispatched: Mutex<Vec<(Uuid, BookingOperation)>>,
    fail: Mutex<bool>,
    stall: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// Make every delivery hang forever, so tests can observe that booking
    /// operations return without waiting on the notifier.
    pub fn stall_all(&self) {
        *self.stall.lock().unwrap() = true;
    }

    pub fn dispatched(&self) -> Vec<(Uuid, BookingOperation)> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn notify(&self, meeting_id: Uuid, operation: BookingOperation) -> DomainResult<()> {
        if *self.stall.lock().unwrap() {
            std::future::pending::<()>().await;
        }
        if *self.fail.lock().unwrap() {
            return Err(SchedulingError::Network("notification endpoint down".into()));
        }
        self.dispatched.lock().unwrap().push((meeting_id, operation));
        Ok(())
    }
}
