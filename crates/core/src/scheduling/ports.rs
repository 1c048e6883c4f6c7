//! Port interfaces for availability resolution and booking
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotbook_domain::{
    AvailabilityRule, EventType, GroupEventType, HostProfile, Meeting, NewParticipant, Result,
    SlotLock,
};
use slotbook_domain::types::meeting::BookingOperation;
use uuid::Uuid;

/// Clock capability injected wherever "now" matters.
///
/// Keeps minimum-notice and lock-expiry decisions deterministic under test.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Read/replace access to a host's recurring weekly windows.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// All rules for a host, available and unavailable alike.
    async fn rules_for_host(&self, host_user_id: Uuid) -> Result<Vec<AvailabilityRule>>;

    /// Replace the host's rule set wholesale (delete-all + reinsert).
    /// Last writer wins; there is no merge.
    async fn replace_rules_for_host(
        &self,
        host_user_id: Uuid,
        rules: Vec<AvailabilityRule>,
    ) -> Result<()>;
}

/// Lookup of event type templates.
#[async_trait]
pub trait EventTypeRepository: Send + Sync {
    async fn find_event_type(&self, id: Uuid) -> Result<Option<EventType>>;

    async fn find_by_booking_link(&self, booking_link: &str) -> Result<Option<EventType>>;

    /// Group template with its host ids resolved from the join relation.
    async fn find_group_event_type(&self, id: Uuid) -> Result<Option<GroupEventType>>;
}

/// Host profile lookup (timezone, contact identity).
#[async_trait]
pub trait HostDirectory: Send + Sync {
    async fn find_host(&self, user_id: Uuid) -> Result<Option<HostProfile>>;
}

/// Which template's meetings count toward a daily cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    EventType(Uuid),
    Group(Uuid),
}

/// Per-day booking cap, evaluated inside the booking transaction.
///
/// `day_start`/`day_end` are the UTC bounds of the host-local calendar day
/// containing the requested slot. Only non-cancelled meetings of the scoped
/// template count toward the limit.
#[derive(Debug, Clone)]
pub struct DailyLimitCheck {
    pub limit: u32,
    pub scope: LimitScope,
    pub day_start: DateTime<Utc>,
    pub day_end: DateTime<Utc>,
}

/// The check half of the ledger's atomic check-then-insert.
///
/// The ledger must reject with `SlotConflict` when any non-cancelled meeting
/// of `host_user_id` (other than `exclude_meeting`) satisfies
/// `existing.start - buffer_before < end AND existing.end + buffer_after >
/// start`, with `NoticeViolation` when `start < not_before`, and with
/// `DailyLimitExceeded` when the daily cap is already met - all evaluated
/// inside the same transaction as the insert or update.
#[derive(Debug, Clone)]
pub struct ConflictCheck {
    pub host_user_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub buffer_before_minutes: u32,
    pub buffer_after_minutes: u32,
    pub not_before: DateTime<Utc>,
    pub daily_limit: Option<DailyLimitCheck>,
    pub exclude_meeting: Option<Uuid>,
}

/// Everything the ledger needs to commit a single-host booking atomically.
#[derive(Debug, Clone)]
pub struct BookingInsert {
    pub event_type_id: Uuid,
    pub host_user_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Display hint recorded on the meeting row.
    pub timezone: String,
    pub host: HostParticipant,
    pub booker: NewParticipant,
    pub check: ConflictCheck,
    /// Advisory lock to consume in the same transaction, when present.
    pub lock_id: Option<String>,
}

/// Host identity recorded as the `is_host = true` participant row.
#[derive(Debug, Clone)]
pub struct HostParticipant {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Atomic commit of a group booking: every host's check must pass inside
/// one transaction, or none of the rows land.
#[derive(Debug, Clone)]
pub struct GroupBookingInsert {
    pub group_event_type_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub hosts: Vec<(HostParticipant, ConflictCheck)>,
    pub booker: NewParticipant,
}

/// The booking ledger: single source of truth for meetings and participants.
///
/// `book`, `book_group`, `reschedule` and `cancel` carry the serializable
/// check-then-insert contract; a caller that lost the race receives
/// `SlotConflict`, never partial state.
#[async_trait]
pub trait MeetingLedger: Send + Sync {
    /// Non-cancelled meetings for a host overlapping the given window.
    async fn meetings_in_range(
        &self,
        host_user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>>;

    async fn find_meeting(&self, meeting_id: Uuid) -> Result<Option<Meeting>>;

    /// Atomically validate and insert a confirmed meeting plus its
    /// participant rows. Returns the new meeting id.
    async fn book(&self, insert: BookingInsert) -> Result<Uuid>;

    /// Atomically validate against every host's ledger and insert one
    /// meeting with a participant row per host plus the booker.
    async fn book_group(&self, insert: GroupBookingInsert) -> Result<Uuid>;

    /// Atomically re-validate and move an existing meeting to new bounds.
    /// Callers pass one check per host whose calendar the meeting occupies
    /// (a single check for solo meetings, one per group host otherwise);
    /// every check must pass inside the transaction, and each excludes the
    /// meeting's own current slot via `check.exclude_meeting`.
    async fn reschedule(
        &self,
        meeting_id: Uuid,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        checks: Vec<ConflictCheck>,
    ) -> Result<()>;

    /// Mark a meeting cancelled. Returns `false` when it was already
    /// cancelled (callers treat that as idempotent success).
    async fn cancel(&self, meeting_id: Uuid) -> Result<bool>;
}

/// Ephemeral advisory slot reservations.
#[async_trait]
pub trait SlotLockRepository: Send + Sync {
    /// Record a lock unless a live lock already covers an overlapping range
    /// for the same host. Returns whether the lock was accepted.
    async fn acquire(&self, lock: SlotLock) -> Result<bool>;

    /// Remove a lock by id. Returns whether a row was removed.
    async fn consume(&self, lock_id: &str) -> Result<bool>;

    /// Drop locks whose TTL elapsed before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Opaque capability check for participant-held reschedule/cancel links.
#[async_trait]
pub trait ParticipantTokenVerifier: Send + Sync {
    async fn verify(&self, meeting_id: Uuid, token: &str) -> Result<bool>;
}

/// Outbound notification sink, invoked after a committed ledger operation.
///
/// Implementations are best-effort: the booking service logs failures and
/// never lets them affect the booking decision.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn notify(&self, meeting_id: Uuid, operation: BookingOperation) -> Result<()>;
}
