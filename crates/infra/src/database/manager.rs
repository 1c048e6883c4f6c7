//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::params;
use slotbook_common::storage::pool::SqliteConn;
use slotbook_common::{SqlitePool, SqlitePoolConfig, StorageError};
use slotbook_domain::{Result, SchedulingError};
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
pub struct DbManager {
    pool: Arc<SqlitePool>,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size.
    ///
    /// # Errors
    /// Returns `Database` if the pool cannot be created.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let config = SqlitePoolConfig { max_size: pool_size.max(1), ..SqlitePoolConfig::default() };

        let pool = SqlitePool::new(&path, config).map_err(map_storage_error)?;

        info!(db_path = %path.display(), pool_size = pool_size.max(1), "sqlite pool initialised");

        Ok(Self { pool: Arc::new(pool), path })
    }

    /// Create a manager over a shared in-memory database. Used by tests and
    /// ephemeral deployments.
    ///
    /// # Errors
    /// Returns `Database` if the pool cannot be created.
    pub fn new_in_memory(name: &str) -> Result<Self> {
        let pool = SqlitePool::new_in_memory(name, SqlitePoolConfig::default())
            .map_err(map_storage_error)?;
        Ok(Self { pool: Arc::new(pool), path: PathBuf::from(format!(":memory:{name}")) })
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &Arc<SqlitePool> {
        &self.pool
    }

    /// Acquire a connection from the pool.
    ///
    /// # Errors
    /// Returns `Database` when the pool is exhausted or the connection fails.
    pub fn get_connection(&self) -> Result<SqliteConn> {
        self.pool.get().map_err(map_storage_error)
    }

    /// Ensure the full schema exists on the current database.
    ///
    /// # Errors
    /// Returns `Database` if schema creation fails.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Perform a health check to verify database connectivity.
    ///
    /// # Errors
    /// Returns `Database` if the probe query fails.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(map_sql_error)?;
        Ok(())
    }
}

fn create_schema(conn: &SqliteConn) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> SchedulingError {
    SchedulingError::from(InfraError::from(err))
}

pub(crate) fn map_storage_error(err: StorageError) -> SchedulingError {
    SchedulingError::from(InfraError::from(err))
}
