//! SQLite-backed implementation of the EventTypeRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Row};
use slotbook_common::SqlitePool;
use slotbook_core::EventTypeRepository;
use slotbook_domain::{EventType, GroupEventType, LocationType, Result};
use tracing::instrument;
use uuid::Uuid;

use super::availability_repository::parse_uuid;
use super::manager::{map_sql_error, map_storage_error};

const EVENT_TYPE_COLUMNS: &str = "id, host_user_id, name, duration_minutes, location_type, \
     location, buffer_before_minutes, buffer_after_minutes, minimum_notice_hours, daily_limit, \
     booking_link, is_active";

const GROUP_COLUMNS: &str = "id, name, duration_minutes, location_type, location, \
     buffer_before_minutes, buffer_after_minutes, minimum_notice_hours, daily_limit, \
     booking_link, is_active";

/// SQLite implementation of EventTypeRepository.
pub struct SqliteEventTypeRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteEventTypeRepository {
    /// Create a new event type repository.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn query_event_type(&self, predicate: &str, value: &str) -> Result<Option<EventType>> {
        let conn = self.pool.get().map_err(map_storage_error)?;
        let sql =
            format!("SELECT {EVENT_TYPE_COLUMNS} FROM event_types WHERE {predicate} LIMIT 1");

        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let mut rows = stmt.query_map(params![value], map_event_type_row).map_err(map_sql_error)?;

        match rows.next() {
            Some(raw) => Ok(Some(raw.map_err(map_sql_error)?.try_into_event_type()?)),
            None => Ok(None),
        }
    }
}

/// Row image before uuid/location parsing, kept separate so rusqlite's row
/// mapper stays infallible on the SQL side.
struct EventTypeRow {
    id: String,
    host_user_id: String,
    name: String,
    duration_minutes: u32,
    location_type: String,
    location: Option<String>,
    buffer_before_minutes: u32,
    buffer_after_minutes: u32,
    minimum_notice_hours: u32,
    daily_limit: Option<u32>,
    booking_link: String,
    is_active: bool,
}

impl EventTypeRow {
    fn try_into_event_type(self) -> Result<EventType> {
        Ok(EventType {
            id: parse_uuid(&self.id)?,
            host_user_id: parse_uuid(&self.host_user_id)?,
            name: self.name,
            duration_minutes: self.duration_minutes,
            location_type: LocationType::parse(&self.location_type)?,
            location: self.location,
            buffer_before_minutes: self.buffer_before_minutes,
            buffer_after_minutes: self.buffer_after_minutes,
            minimum_notice_hours: self.minimum_notice_hours,
            daily_limit: self.daily_limit,
            booking_link: self.booking_link,
            is_active: self.is_active,
        })
    }
}

fn map_event_type_row(row: &Row<'_>) -> rusqlite::Result<EventTypeRow> {
    Ok(EventTypeRow {
        id: row.get(0)?,
        host_user_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        location_type: row.get(4)?,
        location: row.get(5)?,
        buffer_before_minutes: row.get(6)?,
        buffer_after_minutes: row.get(7)?,
        minimum_notice_hours: row.get(8)?,
        daily_limit: row.get(9)?,
        booking_link: row.get(10)?,
        is_active: row.get(11)?,
    })
}

#[async_trait]
impl EventTypeRepository for SqliteEventTypeRepository {
    #[instrument(skip(self), fields(%id))]
    async fn find_event_type(&self, id: Uuid) -> Result<Option<EventType>> {
        self.query_event_type("id = ?1", &id.to_string())
    }

    #[instrument(skip(self))]
    async fn find_by_booking_link(&self, booking_link: &str) -> Result<Option<EventType>> {
        self.query_event_type("booking_link = ?1", booking_link)
    }

    #[instrument(skip(self), fields(%id))]
    async fn find_group_event_type(&self, id: Uuid) -> Result<Option<GroupEventType>> {
        let conn = self.pool.get().map_err(map_storage_error)?;
        let sql = format!("SELECT {GROUP_COLUMNS} FROM group_event_types WHERE id = ?1 LIMIT 1");

        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let mut rows = stmt
            .query_map(params![id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, u32>(6)?,
                    row.get::<_, u32>(7)?,
                    row.get::<_, Option<u32>>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, bool>(10)?,
                ))
            })
            .map_err(map_sql_error)?;

        let Some(raw) = rows.next() else {
            return Ok(None);
        };
        let (
            group_id,
            name,
            duration_minutes,
            location_type,
            location,
            buffer_before_minutes,
            buffer_after_minutes,
            minimum_notice_hours,
            daily_limit,
            booking_link,
            is_active,
        ) = raw.map_err(map_sql_error)?;
        drop(rows);
        drop(stmt);

        let mut host_stmt = conn
            .prepare(
                "SELECT host_user_id FROM group_event_type_hosts
                 WHERE group_event_type_id = ?1
                 ORDER BY rowid",
            )
            .map_err(map_sql_error)?;
        let host_rows = host_stmt
            .query_map(params![id.to_string()], |row| row.get::<_, String>(0))
            .map_err(map_sql_error)?;

        let mut host_user_ids = Vec::new();
        for host in host_rows {
            host_user_ids.push(parse_uuid(&host.map_err(map_sql_error)?)?);
        }

        Ok(Some(GroupEventType {
            id: parse_uuid(&group_id)?,
            name,
            duration_minutes,
            location_type: LocationType::parse(&location_type)?,
            location,
            buffer_before_minutes,
            buffer_after_minutes,
            minimum_notice_hours,
            daily_limit,
            booking_link,
            is_active,
            host_user_ids,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DbManager;

    fn repository() -> (DbManager, SqliteEventTypeRepository) {
        let manager =
            DbManager::new_in_memory(&format!("event-types-{}", Uuid::new_v4())).unwrap();
        manager.run_migrations().unwrap();
        let repo = SqliteEventTypeRepository::new(manager.pool().clone());
        (manager, repo)
    }

    fn seed_host(manager: &DbManager) -> Uuid {
        let user_id = Uuid::new_v4();
        let conn = manager.get_connection().unwrap();
        conn.execute(
            "INSERT INTO host_profiles (user_id, username, display_name, email, timezone)
             VALUES (?1, ?2, NULL, 'host@example.com', 'UTC')",
            params![user_id.to_string(), format!("host-{user_id}")],
        )
        .unwrap();
        user_id
    }

    fn seed_event_type(manager: &DbManager, host: Uuid, link: &str) -> Uuid {
        let id = Uuid::new_v4();
        let conn = manager.get_connection().unwrap();
        conn.execute(
            "INSERT INTO event_types
                (id, host_user_id, name, duration_minutes, location_type, location,
                 buffer_before_minutes, buffer_after_minutes, minimum_notice_hours,
                 daily_limit, booking_link, is_active)
             VALUES (?1, ?2, 'Intro call', 30, 'video', NULL, 10, 5, 24, 3, ?3, 1)",
            params![id.to_string(), host.to_string(), link],
        )
        .unwrap();
        id
    }

    #[tokio::test]
    async fn event_type_loads_by_id_and_link() {
        let (manager, repo) = repository();
        let host = seed_host(&manager);
        let id = seed_event_type(&manager, host, "intro-call");

        let by_id = repo.find_event_type(id).await.unwrap().unwrap();
        assert_eq!(by_id.duration_minutes, 30);
        assert_eq!(by_id.location_type, LocationType::Video);
        assert_eq!(by_id.daily_limit, Some(3));

        let by_link = repo.find_by_booking_link("intro-call").await.unwrap().unwrap();
        assert_eq!(by_link.id, id);

        assert!(repo.find_by_booking_link("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn group_event_type_resolves_hosts() {
        let (manager, repo) = repository();
        let host_a = seed_host(&manager);
        let host_b = seed_host(&manager);

        let group_id = Uuid::new_v4();
        let conn = manager.get_connection().unwrap();
        conn.execute(
            "INSERT INTO group_event_types
                (id, name, duration_minutes, location_type, location,
                 buffer_before_minutes, buffer_after_minutes, minimum_notice_hours,
                 daily_limit, booking_link, is_active)
             VALUES (?1, 'Panel', 45, 'video', NULL, 0, 0, 24, NULL, 'panel', 1)",
            params![group_id.to_string()],
        )
        .unwrap();
        for host in [host_a, host_b] {
            conn.execute(
                "INSERT INTO group_event_type_hosts (group_event_type_id, host_user_id)
                 VALUES (?1, ?2)",
                params![group_id.to_string(), host.to_string()],
            )
            .unwrap();
        }
        drop(conn);

        let group = repo.find_group_event_type(group_id).await.unwrap().unwrap();
        assert_eq!(group.duration_minutes, 45);
        assert_eq!(group.host_user_ids, vec![host_a, host_b]);
    }
}
