//! SQLite-backed implementation of the SlotLockRepository port.
//!
//! Locks are advisory. A dead lock row can at worst hide a slot for its TTL;
//! it can never corrupt the ledger, so acquisition runs in a plain immediate
//! transaction with no retry logic.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, TransactionBehavior};
use slotbook_common::SqlitePool;
use slotbook_core::SlotLockRepository;
use slotbook_domain::{Result, SlotLock};
use tracing::{debug, instrument};

use super::manager::{map_sql_error, map_storage_error};

/// SQLite implementation of SlotLockRepository.
pub struct SqliteSlotLockRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteSlotLockRepository {
    /// Create a new slot lock repository.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotLockRepository for SqliteSlotLockRepository {
    #[instrument(skip(self, lock), fields(lock_id = %lock.lock_id))]
    async fn acquire(&self, lock: SlotLock) -> Result<bool> {
        let mut conn = self.pool.get().map_err(map_storage_error)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;

        let now = Utc::now().timestamp();
        let taken: bool = tx
            .query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM slot_locks
                    WHERE user_id = ?1
                      AND expires_at > ?2
                      AND start_ts < ?3
                      AND end_ts > ?4)",
                params![
                    lock.user_id.to_string(),
                    now,
                    lock.end_time.timestamp(),
                    lock.start_time.timestamp(),
                ],
                |row| row.get(0),
            )
            .map_err(map_sql_error)?;
        if taken {
            return Ok(false);
        }

        tx.execute(
            "INSERT OR REPLACE INTO slot_locks
                (lock_id, user_id, event_type_id, start_ts, end_ts, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lock.lock_id,
                lock.user_id.to_string(),
                lock.event_type_id.to_string(),
                lock.start_time.timestamp(),
                lock.end_time.timestamp(),
                lock.expires_at.timestamp(),
            ],
        )
        .map_err(map_sql_error)?;
        tx.commit().map_err(map_sql_error)?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn consume(&self, lock_id: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(map_storage_error)?;
        let removed = conn
            .execute("DELETE FROM slot_locks WHERE lock_id = ?1", params![lock_id])
            .map_err(map_sql_error)?;
        Ok(removed > 0)
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let conn = self.pool.get().map_err(map_storage_error)?;
        let purged = conn
            .execute("DELETE FROM slot_locks WHERE expires_at <= ?1", params![now.timestamp()])
            .map_err(map_sql_error)?;
        if purged > 0 {
            debug!(purged, "purged expired slot locks");
        }
        Ok(purged)
    }
}
