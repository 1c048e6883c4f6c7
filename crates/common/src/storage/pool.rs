//! SQLite connection pool
//!
//! Provides r2d2-based connection pooling for the booking ledger database.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::pragmas::apply_connection_pragmas;
use crate::storage::error::{StorageError, StorageResult};

/// Pooled SQLite connection handle
pub type SqliteConn = PooledConnection<SqliteConnectionManager>;

/// SQLite connection pool
///
/// Manages a pool of SQLite connections using r2d2. Every connection gets
/// the same pragma set applied on checkout initialisation (WAL, NORMAL
/// synchronous, foreign keys, busy timeout).
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Create a new SQLite connection pool backed by a file.
    ///
    /// # Errors
    /// Returns an error if the database file can't be accessed or pool
    /// creation fails.
    #[instrument(fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        info!("Creating SQLite connection pool");

        let manager = SqliteConnectionManager::file(path);
        Self::build(manager, config)
    }

    /// Create a pool backed by a shared in-memory database.
    ///
    /// Used by tests and ephemeral deployments. A unique name keeps separate
    /// pools isolated while letting connections within one pool share state.
    pub fn new_in_memory(name: &str, config: SqlitePoolConfig) -> StorageResult<Self> {
        let uri = format!("file:{}?mode=memory&cache=shared", name);
        let manager = SqliteConnectionManager::file(uri).with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        );
        Self::build(manager, config)
    }

    fn build(manager: SqliteConnectionManager, config: SqlitePoolConfig) -> StorageResult<Self> {
        let pool_config = config.clone();
        let manager = manager.with_init(move |conn| {
            apply_connection_pragmas(conn, &pool_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {}", e))
            })?;

        // Verify the pool hands out working connections before returning it
        {
            let conn = pool.get().map_err(|e| {
                StorageError::Connection(format!("Failed to get test connection: {}", e))
            })?;
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        }

        debug!("SQLite pool verified with test connection");

        Ok(Self { pool, config })
    }

    /// Get a connection from the pool.
    ///
    /// # Errors
    /// Returns `StorageError::Timeout` when the pool is saturated past the
    /// configured connection timeout.
    #[instrument(skip(self), fields(pool_size = self.config.max_size))]
    pub fn get(&self) -> StorageResult<SqliteConn> {
        match self.pool.get() {
            Ok(conn) => Ok(conn),
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("timeout") {
                    warn!("Connection timeout after {:?}", self.config.connection_timeout);
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    warn!("Connection error: {}", e);
                    Err(StorageError::Connection(format!("Failed to get connection: {}", e)))
                }
            }
        }
    }

    /// Number of idle connections currently in the pool.
    pub fn idle_connections(&self) -> u32 {
        self.pool.state().idle_connections
    }
}
