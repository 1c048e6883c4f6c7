//! Shared test support: in-memory port implementations and fixtures.

pub mod repositories;

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use slotbook_core::{BookingService, SlotCalculator};
use slotbook_domain::{AvailabilityRule, EventType, HostProfile, LocationType, NewParticipant};
use uuid::Uuid;

use repositories::{
    FixedClock, InMemoryAvailability, InMemoryEventTypes, InMemoryHosts, InMemoryLedger,
    InMemoryLocks, InMemoryTokens, RecordingNotifier,
};

/// Everything a service test needs, with handles kept for assertions.
pub struct TestHarness {
    pub event_types: Arc<InMemoryEventTypes>,
    pub availability: Arc<InMemoryAvailability>,
    pub hosts: Arc<InMemoryHosts>,
    pub ledger: Arc<InMemoryLedger>,
    pub locks: Arc<InMemoryLocks>,
    pub tokens: Arc<InMemoryTokens>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
}

impl TestHarness {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            event_types: Arc::new(InMemoryEventTypes::default()),
            availability: Arc::new(InMemoryAvailability::default()),
            hosts: Arc::new(InMemoryHosts::default()),
            ledger: Arc::new(InMemoryLedger::default()),
            locks: Arc::new(InMemoryLocks::default()),
            tokens: Arc::new(InMemoryTokens::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            clock: Arc::new(FixedClock::new(now)),
        }
    }

    pub fn slot_calculator(&self) -> SlotCalculator {
        SlotCalculator::new(
            self.event_types.clone(),
            self.availability.clone(),
            self.hosts.clone(),
            self.ledger.clone(),
            self.clock.clone(),
        )
    }

    pub fn booking_service(&self) -> BookingService {
        BookingService::new(
            self.event_types.clone(),
            self.hosts.clone(),
            self.ledger.clone(),
            self.locks.clone(),
            self.tokens.clone(),
            self.notifier.clone(),
            self.clock.clone(),
        )
    }

    /// Let background notification tasks run before asserting on them.
    pub async fn settle(&self) {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }
}

/// A Monday morning well inside 2024, far from any DST transition in UTC.
pub fn monday_9am_utc() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn host(timezone: &str) -> HostProfile {
    let user_id = Uuid::new_v4();
    HostProfile {
        user_id,
        username: format!("host-{user_id}"),
        display_name: Some("Test Host".into()),
        email: "host@example.com".into(),
        timezone: timezone.to_string(),
    }
}

pub fn event_type(host_user_id: Uuid, duration_minutes: u32) -> EventType {
    EventType {
        id: Uuid::new_v4(),
        host_user_id,
        name: "Intro call".into(),
        duration_minutes,
        location_type: LocationType::Video,
        location: None,
        buffer_before_minutes: 0,
        buffer_after_minutes: 0,
        minimum_notice_hours: 0,
        daily_limit: None,
        booking_link: format!("intro-{}", Uuid::new_v4()),
        is_active: true,
    }
}

/// A weekly rule on `day_of_week` (0 = Sunday) in host-local wall-clock time.
pub fn rule(host_user_id: Uuid, day_of_week: u8, start: (u32, u32), end: (u32, u32)) -> AvailabilityRule {
    AvailabilityRule {
        id: Uuid::new_v4(),
        host_user_id,
        day_of_week,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        is_available: true,
    }
}

pub fn guest() -> NewParticipant {
    NewParticipant {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        notes: None,
    }
}
