//! SQLite-backed implementation of the MeetingLedger port.
//!
//! Every write runs inside a `BEGIN IMMEDIATE` transaction, so the overlap,
//! notice and daily-limit checks are serialized against concurrent bookings:
//! of two racing requests for overlapping slots, exactly one commits and the
//! other observes the committed row and fails with `SlotConflict`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row, Transaction, TransactionBehavior};
use slotbook_common::SqlitePool;
use slotbook_core::{
    BookingInsert, ConflictCheck, GroupBookingInsert, HostParticipant, LimitScope, MeetingLedger,
    ParticipantTokenVerifier,
};
use slotbook_domain::{
    Meeting, MeetingStatus, NewParticipant, Result, SchedulingError,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::availability_repository::parse_uuid;
use super::manager::{map_sql_error, map_storage_error};

const MEETING_COLUMNS: &str = "id, event_type_id, group_event_type_id, host_user_id, start_ts, \
     end_ts, timezone, status, calendar_event_id, calendar_provider";

/// A meeting is on a host's calendar if they own it or appear on it as a
/// host participant (group meetings).
const HOST_SCOPE: &str = "(m.host_user_id = :host OR EXISTS (
        SELECT 1 FROM meeting_participants p
        WHERE p.meeting_id = m.id AND p.is_host = 1 AND p.user_id = :host))";

/// SQLite implementation of MeetingLedger and ParticipantTokenVerifier.
pub struct SqliteMeetingLedger {
    pool: Arc<SqlitePool>,
}

impl SqliteMeetingLedger {
    /// Create a new meeting ledger.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// The opaque token handed to the booker for reschedule/cancel links.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown meeting.
    pub fn participant_token(&self, meeting_id: Uuid) -> Result<String> {
        let conn = self.pool.get().map_err(map_storage_error)?;
        conn.query_row(
            "SELECT participant_token FROM meetings WHERE id = ?1",
            params![meeting_id.to_string()],
            |row| row.get::<_, String>(0),
        )
        .map_err(map_sql_error)
    }

    fn insert_participant(
        tx: &Transaction<'_>,
        meeting_id: Uuid,
        user_id: Option<Uuid>,
        name: &str,
        email: &str,
        is_host: bool,
        notes: Option<&str>,
    ) -> Result<()> {
        tx.execute(
            "INSERT INTO meeting_participants (meeting_id, user_id, name, email, is_host, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                meeting_id.to_string(),
                user_id.map(|id| id.to_string()),
                name,
                email,
                is_host,
                notes,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    fn insert_meeting_row(tx: &Transaction<'_>, row: &MeetingInsertRow<'_>) -> Result<()> {
        tx.execute(
            "INSERT INTO meetings
                (id, event_type_id, group_event_type_id, host_user_id, start_ts, end_ts,
                 timezone, status, participant_token, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'confirmed', ?8, ?9)",
            params![
                row.meeting_id.to_string(),
                row.event_type_id.map(|id| id.to_string()),
                row.group_event_type_id.map(|id| id.to_string()),
                row.host_user_id.to_string(),
                row.start.timestamp(),
                row.end.timestamp(),
                row.timezone,
                row.participant_token,
                Utc::now().timestamp(),
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    fn insert_booker(
        tx: &Transaction<'_>,
        meeting_id: Uuid,
        booker: &NewParticipant,
    ) -> Result<()> {
        Self::insert_participant(
            tx,
            meeting_id,
            None,
            &booker.name,
            &booker.email,
            false,
            booker.notes.as_deref(),
        )
    }

    fn insert_host(
        tx: &Transaction<'_>,
        meeting_id: Uuid,
        host: &HostParticipant,
    ) -> Result<()> {
        Self::insert_participant(
            tx,
            meeting_id,
            Some(host.user_id),
            &host.name,
            &host.email,
            true,
            None,
        )
    }
}

struct MeetingInsertRow<'a> {
    meeting_id: Uuid,
    event_type_id: Option<Uuid>,
    group_event_type_id: Option<Uuid>,
    host_user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timezone: &'a str,
    participant_token: &'a str,
}

/// Run the check half of the check-then-insert inside the open transaction.
fn apply_check(tx: &Transaction<'_>, check: &ConflictCheck) -> Result<()> {
    if check.start < check.not_before {
        return Err(SchedulingError::NoticeViolation(
            "slot starts inside the minimum notice window".into(),
        ));
    }

    let exclude = check.exclude_meeting.map(|id| id.to_string()).unwrap_or_default();
    let sql = format!(
        "SELECT EXISTS (
            SELECT 1 FROM meetings m
            WHERE {HOST_SCOPE}
              AND m.status != 'cancelled'
              AND m.id != :exclude
              AND m.start_ts - :before < :new_end
              AND m.end_ts + :after > :new_start)"
    );
    let conflict: bool = tx
        .query_row(
            &sql,
            rusqlite::named_params! {
                ":host": check.host_user_id.to_string(),
                ":exclude": exclude,
                ":before": i64::from(check.buffer_before_minutes) * 60,
                ":after": i64::from(check.buffer_after_minutes) * 60,
                ":new_start": check.start.timestamp(),
                ":new_end": check.end.timestamp(),
            },
            |row| row.get(0),
        )
        .map_err(map_sql_error)?;
    if conflict {
        return Err(SchedulingError::SlotConflict("slot overlaps an existing meeting".into()));
    }

    if let Some(limit) = &check.daily_limit {
        let (column, template_id) = match limit.scope {
            LimitScope::EventType(id) => ("event_type_id", id),
            LimitScope::Group(id) => ("group_event_type_id", id),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM meetings m
             WHERE {HOST_SCOPE}
               AND m.status != 'cancelled'
               AND m.id != :exclude
               AND m.{column} = :template
               AND m.start_ts >= :day_start
               AND m.start_ts < :day_end"
        );
        let booked: u32 = tx
            .query_row(
                &sql,
                rusqlite::named_params! {
                    ":host": check.host_user_id.to_string(),
                    ":exclude": exclude,
                    ":template": template_id.to_string(),
                    ":day_start": limit.day_start.timestamp(),
                    ":day_end": limit.day_end.timestamp(),
                },
                |row| row.get(0),
            )
            .map_err(map_sql_error)?;
        if booked >= limit.limit {
            return Err(SchedulingError::DailyLimitExceeded(format!(
                "daily limit of {} reached",
                limit.limit
            )));
        }
    }

    Ok(())
}

fn map_meeting_row(row: &Row<'_>) -> rusqlite::Result<RawMeeting> {
    Ok(RawMeeting {
        id: row.get(0)?,
        event_type_id: row.get(1)?,
        group_event_type_id: row.get(2)?,
        host_user_id: row.get(3)?,
        start_ts: row.get(4)?,
        end_ts: row.get(5)?,
        timezone: row.get(6)?,
        status: row.get(7)?,
        calendar_event_id: row.get(8)?,
        calendar_provider: row.get(9)?,
    })
}

struct RawMeeting {
    id: String,
    event_type_id: Option<String>,
    group_event_type_id: Option<String>,
    host_user_id: String,
    start_ts: i64,
    end_ts: i64,
    timezone: String,
    status: String,
    calendar_event_id: Option<String>,
    calendar_provider: Option<String>,
}

impl RawMeeting {
    fn try_into_meeting(self) -> Result<Meeting> {
        Ok(Meeting {
            id: parse_uuid(&self.id)?,
            event_type_id: self.event_type_id.as_deref().map(parse_uuid).transpose()?,
            group_event_type_id: self
                .group_event_type_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?,
            host_user_id: parse_uuid(&self.host_user_id)?,
            start_time: parse_timestamp(self.start_ts)?,
            end_time: parse_timestamp(self.end_ts)?,
            timezone: self.timezone,
            status: MeetingStatus::parse(&self.status)?,
            calendar_event_id: self.calendar_event_id,
            calendar_provider: self.calendar_provider,
        })
    }
}

fn parse_timestamp(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| SchedulingError::Database(format!("timestamp out of range: {ts}")))
}

#[async_trait]
impl MeetingLedger for SqliteMeetingLedger {
    #[instrument(skip(self), fields(%host_user_id))]
    async fn meetings_in_range(
        &self,
        host_user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>> {
        let conn = self.pool.get().map_err(map_storage_error)?;

        let sql = format!(
            "SELECT {MEETING_COLUMNS} FROM meetings m
             WHERE {HOST_SCOPE}
               AND m.status != 'cancelled'
               AND m.start_ts < :range_end
               AND m.end_ts > :range_start
             ORDER BY m.start_ts"
        );
        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let rows = stmt
            .query_map(
                rusqlite::named_params! {
                    ":host": host_user_id.to_string(),
                    ":range_start": start.timestamp(),
                    ":range_end": end.timestamp(),
                },
                map_meeting_row,
            )
            .map_err(map_sql_error)?;

        let mut meetings = Vec::new();
        for raw in rows {
            meetings.push(raw.map_err(map_sql_error)?.try_into_meeting()?);
        }
        debug!(count = meetings.len(), "loaded meetings in range");
        Ok(meetings)
    }

    #[instrument(skip(self), fields(%meeting_id))]
    async fn find_meeting(&self, meeting_id: Uuid) -> Result<Option<Meeting>> {
        let conn = self.pool.get().map_err(map_storage_error)?;

        let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings m WHERE m.id = ?1");
        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let mut rows =
            stmt.query_map(params![meeting_id.to_string()], map_meeting_row).map_err(map_sql_error)?;

        match rows.next() {
            Some(raw) => Ok(Some(raw.map_err(map_sql_error)?.try_into_meeting()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, insert), fields(event_type_id = %insert.event_type_id))]
    async fn book(&self, insert: BookingInsert) -> Result<Uuid> {
        let mut conn = self.pool.get().map_err(map_storage_error)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;

        apply_check(&tx, &insert.check)?;

        let meeting_id = Uuid::new_v4();
        let token = Uuid::new_v4().to_string();
        Self::insert_meeting_row(
            &tx,
            &MeetingInsertRow {
                meeting_id,
                event_type_id: Some(insert.event_type_id),
                group_event_type_id: None,
                host_user_id: insert.host_user_id,
                start: insert.start,
                end: insert.end,
                timezone: &insert.timezone,
                participant_token: &token,
            },
        )?;
        Self::insert_host(&tx, meeting_id, &insert.host)?;
        Self::insert_booker(&tx, meeting_id, &insert.booker)?;

        if let Some(lock_id) = &insert.lock_id {
            tx.execute("DELETE FROM slot_locks WHERE lock_id = ?1", params![lock_id])
                .map_err(map_sql_error)?;
        }

        tx.commit().map_err(map_sql_error)?;
        debug!(%meeting_id, "meeting committed");
        Ok(meeting_id)
    }

    #[instrument(skip(self, insert), fields(group_event_type_id = %insert.group_event_type_id))]
    async fn book_group(&self, insert: GroupBookingInsert) -> Result<Uuid> {
        let primary = insert.hosts.first().ok_or_else(|| {
            SchedulingError::InvalidInput("group booking requires at least one host".into())
        })?;

        let mut conn = self.pool.get().map_err(map_storage_error)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;

        for (_, check) in &insert.hosts {
            apply_check(&tx, check)?;
        }

        let meeting_id = Uuid::new_v4();
        let token = Uuid::new_v4().to_string();
        Self::insert_meeting_row(
            &tx,
            &MeetingInsertRow {
                meeting_id,
                event_type_id: None,
                group_event_type_id: Some(insert.group_event_type_id),
                host_user_id: primary.0.user_id,
                start: insert.start,
                end: insert.end,
                timezone: &insert.timezone,
                participant_token: &token,
            },
        )?;
        for (host, _) in &insert.hosts {
            Self::insert_host(&tx, meeting_id, host)?;
        }
        Self::insert_booker(&tx, meeting_id, &insert.booker)?;

        tx.commit().map_err(map_sql_error)?;
        debug!(%meeting_id, hosts = insert.hosts.len(), "group meeting committed");
        Ok(meeting_id)
    }

    #[instrument(skip(self, checks), fields(%meeting_id))]
    async fn reschedule(
        &self,
        meeting_id: Uuid,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        checks: Vec<ConflictCheck>,
    ) -> Result<()> {
        let mut conn = self.pool.get().map_err(map_storage_error)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;

        // One check per host on the meeting; all must clear before the move.
        for check in &checks {
            apply_check(&tx, check)?;
        }

        let updated = tx
            .execute(
                "UPDATE meetings SET start_ts = ?1, end_ts = ?2 WHERE id = ?3",
                params![new_start.timestamp(), new_end.timestamp(), meeting_id.to_string()],
            )
            .map_err(map_sql_error)?;
        if updated == 0 {
            return Err(SchedulingError::NotFound(format!("meeting {meeting_id} not found")));
        }

        tx.commit().map_err(map_sql_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(%meeting_id))]
    async fn cancel(&self, meeting_id: Uuid) -> Result<bool> {
        let mut conn = self.pool.get().map_err(map_storage_error)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;

        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM meetings WHERE id = ?1",
                params![meeting_id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(map_sql_error(other)),
            })?;

        match status.as_deref() {
            None => Err(SchedulingError::NotFound(format!("meeting {meeting_id} not found"))),
            Some("cancelled") => Ok(false),
            Some(_) => {
                tx.execute(
                    "UPDATE meetings SET status = 'cancelled' WHERE id = ?1",
                    params![meeting_id.to_string()],
                )
                .map_err(map_sql_error)?;
                tx.commit().map_err(map_sql_error)?;
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl ParticipantTokenVerifier for SqliteMeetingLedger {
    #[instrument(skip(self, token), fields(%meeting_id))]
    async fn verify(&self, meeting_id: Uuid, token: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(map_storage_error)?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT participant_token FROM meetings WHERE id = ?1",
                params![meeting_id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(map_sql_error(other)),
            })?;
        Ok(stored.is_some_and(|t| t == token))
    }
}
