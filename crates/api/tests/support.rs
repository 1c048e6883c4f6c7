//! Shared fixtures for command-layer integration tests.
//!
//! Each test gets its own shared-cache in-memory database, seeded through
//! the real repositories and plain SQL where no write path exists.

#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rusqlite::params;
use slotbook_api::AppContext;
use slotbook_domain::{Config, HostProfile};
use slotbook_infra::DbManager;
use uuid::Uuid;

/// Build a context over a fresh in-memory database with notifications off.
pub fn test_context() -> AppContext {
    slotbook_api::logging::init();

    let mut config = Config::default();
    config.notifications.enabled = false;

    let db = DbManager::new_in_memory(&format!("api-test-{}", Uuid::new_v4()))
        .expect("in-memory database");
    AppContext::with_database(config, db).expect("context wiring")
}

/// A calendar date comfortably inside the booking horizon. Commands run
/// against the real clock, so fixtures anchor on "a week from now".
pub fn a_week_out() -> NaiveDate {
    (Utc::now() + Duration::days(7)).date_naive()
}

/// Weekday of [`a_week_out`] in Sunday-zero numbering.
pub fn a_week_out_dow() -> u8 {
    u8::try_from(a_week_out().weekday().num_days_from_sunday()).expect("weekday fits in u8")
}

pub fn seed_host(ctx: &AppContext, timezone: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    ctx.hosts
        .upsert_host(&HostProfile {
            user_id,
            username: format!("host-{user_id}"),
            display_name: Some("Jamie Rivera".to_string()),
            email: "jamie@example.com".to_string(),
            timezone: timezone.to_string(),
        })
        .expect("seed host");
    user_id
}

/// Insert a weekly availability rule for the host, `HH:MM` wall clock.
pub fn seed_rule(ctx: &AppContext, host_user_id: Uuid, day_of_week: u8, start: &str, end: &str) {
    let conn = ctx.db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO availability_rules (id, host_user_id, day_of_week, start_time, end_time, is_available)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        params![Uuid::new_v4().to_string(), host_user_id.to_string(), day_of_week, start, end],
    )
    .expect("seed rule");
}

/// Insert a 30-minute event type with no buffers, no notice, no daily limit.
pub fn seed_event_type(ctx: &AppContext, host_user_id: Uuid) -> Uuid {
    seed_event_type_with(ctx, host_user_id, 30, 0, 0, 0, None)
}

#[allow(clippy::too_many_arguments)]
pub fn seed_event_type_with(
    ctx: &AppContext,
    host_user_id: Uuid,
    duration_minutes: u32,
    buffer_before: u32,
    buffer_after: u32,
    notice_hours: u32,
    daily_limit: Option<u32>,
) -> Uuid {
    let id = Uuid::new_v4();
    let conn = ctx.db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO event_types (id, host_user_id, name, duration_minutes, location_type,
                                  buffer_before_minutes, buffer_after_minutes,
                                  minimum_notice_hours, daily_limit, booking_link, is_active)
         VALUES (?1, ?2, 'Intro Call', ?3, 'video', ?4, ?5, ?6, ?7, ?8, 1)",
        params![
            id.to_string(),
            host_user_id.to_string(),
            duration_minutes,
            buffer_before,
            buffer_after,
            notice_hours,
            daily_limit,
            format!("intro-{id}"),
        ],
    )
    .expect("seed event type");
    id
}

/// Insert a group event type spanning the given hosts.
pub fn seed_group_event_type(ctx: &AppContext, hosts: &[Uuid], duration_minutes: u32) -> Uuid {
    let id = Uuid::new_v4();
    let conn = ctx.db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO group_event_types (id, name, duration_minutes, location_type,
                                        minimum_notice_hours, booking_link, is_active)
         VALUES (?1, 'Panel Interview', ?2, 'video', 0, ?3, 1)",
        params![id.to_string(), duration_minutes, format!("panel-{id}")],
    )
    .expect("seed group event type");
    for host in hosts {
        conn.execute(
            "INSERT INTO group_event_type_hosts (group_event_type_id, host_user_id) VALUES (?1, ?2)",
            params![id.to_string(), host.to_string()],
        )
        .expect("seed group host");
    }
    id
}

/// Read the opaque participant token persisted for a meeting.
pub fn participant_token(ctx: &AppContext, meeting_id: Uuid) -> String {
    let conn = ctx.db.get_connection().expect("connection");
    conn.query_row(
        "SELECT participant_token FROM meetings WHERE id = ?1",
        params![meeting_id.to_string()],
        |row| row.get(0),
    )
    .expect("participant token")
}

/// Read a meeting's status text.
pub fn meeting_status(ctx: &AppContext, meeting_id: Uuid) -> String {
    let conn = ctx.db.get_connection().expect("connection");
    conn.query_row(
        "SELECT status FROM meetings WHERE id = ?1",
        params![meeting_id.to_string()],
        |row| row.get(0),
    )
    .expect("meeting status")
}
