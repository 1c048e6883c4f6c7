//! SQLite-backed implementation of the AvailabilityRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use rusqlite::params;
use slotbook_common::SqlitePool;
use slotbook_core::AvailabilityRepository;
use slotbook_domain::{AvailabilityRule, Result, SchedulingError};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::{map_sql_error, map_storage_error};

/// SQLite implementation of AvailabilityRepository.
///
/// Rule windows are stored as `HH:MM` text in the host's local wall-clock
/// time; projection to UTC happens in the slot calculator.
pub struct SqliteAvailabilityRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteAvailabilityRepository {
    /// Create a new availability repository.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepository {
    #[instrument(skip(self), fields(%host_user_id))]
    async fn rules_for_host(&self, host_user_id: Uuid) -> Result<Vec<AvailabilityRule>> {
        let conn = self.pool.get().map_err(map_storage_error)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, host_user_id, day_of_week, start_time, end_time, is_available
                 FROM availability_rules
                 WHERE host_user_id = ?1
                 ORDER BY day_of_week, start_time",
            )
            .map_err(map_sql_error)?;

        let rows = stmt
            .query_map(params![host_user_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u8>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, bool>(5)?,
                ))
            })
            .map_err(map_sql_error)?;

        let mut rules = Vec::new();
        for row in rows {
            let (id, host, day_of_week, start, end, is_available) = row.map_err(map_sql_error)?;
            rules.push(AvailabilityRule {
                id: parse_uuid(&id)?,
                host_user_id: parse_uuid(&host)?,
                day_of_week,
                start_time: parse_wall_clock(&start)?,
                end_time: parse_wall_clock(&end)?,
                is_available,
            });
        }

        debug!(count = rules.len(), "loaded availability rules");
        Ok(rules)
    }

    #[instrument(skip(self, rules), fields(%host_user_id, count = rules.len()))]
    async fn replace_rules_for_host(
        &self,
        host_user_id: Uuid,
        rules: Vec<AvailabilityRule>,
    ) -> Result<()> {
        for rule in &rules {
            rule.validate()?;
            if rule.host_user_id != host_user_id {
                return Err(SchedulingError::InvalidInput(format!(
                    "rule {} belongs to a different host",
                    rule.id
                )));
            }
        }

        let mut conn = self.pool.get().map_err(map_storage_error)?;
        let tx = conn.transaction().map_err(map_sql_error)?;

        tx.execute(
            "DELETE FROM availability_rules WHERE host_user_id = ?1",
            params![host_user_id.to_string()],
        )
        .map_err(map_sql_error)?;

        for rule in &rules {
            tx.execute(
                "INSERT INTO availability_rules
                    (id, host_user_id, day_of_week, start_time, end_time, is_available)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rule.id.to_string(),
                    rule.host_user_id.to_string(),
                    rule.day_of_week,
                    rule.start_time.format("%H:%M").to_string(),
                    rule.end_time.format("%H:%M").to_string(),
                    rule.is_available,
                ],
            )
            .map_err(map_sql_error)?;
        }

        tx.commit().map_err(map_sql_error)?;
        Ok(())
    }
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| SchedulingError::Database(format!("malformed uuid in database: {value}")))
}

fn parse_wall_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| SchedulingError::Database(format!("malformed rule time: {value}")))
}
