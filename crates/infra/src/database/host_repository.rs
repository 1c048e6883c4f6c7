//! SQLite-backed implementation of the HostDirectory port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use slotbook_common::SqlitePool;
use slotbook_core::HostDirectory;
use slotbook_domain::{HostProfile, Result};
use tracing::instrument;
use uuid::Uuid;

use super::availability_repository::parse_uuid;
use super::manager::{map_sql_error, map_storage_error};

/// SQLite implementation of HostDirectory.
pub struct SqliteHostDirectory {
    pool: Arc<SqlitePool>,
}

impl SqliteHostDirectory {
    /// Create a new host directory.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Insert or update a host profile.
    ///
    /// # Errors
    /// Returns `Database` on write failure.
    #[instrument(skip(self, host), fields(user_id = %host.user_id))]
    pub fn upsert_host(&self, host: &HostProfile) -> Result<()> {
        let conn = self.pool.get().map_err(map_storage_error)?;
        conn.execute(
            "INSERT INTO host_profiles (user_id, username, display_name, email, timezone)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                display_name = excluded.display_name,
                email = excluded.email,
                timezone = excluded.timezone",
            params![
                host.user_id.to_string(),
                host.username,
                host.display_name,
                host.email,
                host.timezone,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }
}

#[async_trait]
impl HostDirectory for SqliteHostDirectory {
    #[instrument(skip(self), fields(%user_id))]
    async fn find_host(&self, user_id: Uuid) -> Result<Option<HostProfile>> {
        let conn = self.pool.get().map_err(map_storage_error)?;

        let mut stmt = conn
            .prepare(
                "SELECT user_id, username, display_name, email, timezone
                 FROM host_profiles WHERE user_id = ?1",
            )
            .map_err(map_sql_error)?;
        let mut rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(map_sql_error)?;

        match rows.next() {
            Some(raw) => {
                let (id, username, display_name, email, timezone) = raw.map_err(map_sql_error)?;
                Ok(Some(HostProfile {
                    user_id: parse_uuid(&id)?,
                    username,
                    display_name,
                    email,
                    timezone,
                }))
            }
            None => Ok(None),
        }
    }
}
