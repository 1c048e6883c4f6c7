//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use slotbook_common::StorageError;
use slotbook_domain::SchedulingError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SchedulingError);

impl From<InfraError> for SchedulingError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SchedulingError> for InfraError {
    fn from(value: SchedulingError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSchedulingError {
    fn into_scheduling(self) -> SchedulingError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SchedulingError */
/* -------------------------------------------------------------------------- */

impl IntoSchedulingError for SqlError {
    fn into_scheduling(self) -> SchedulingError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        SchedulingError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        SchedulingError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        SchedulingError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        SchedulingError::Database("foreign key constraint violation".into())
                    }
                    _ => SchedulingError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                SchedulingError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                SchedulingError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SchedulingError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                SchedulingError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                SchedulingError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => SchedulingError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => SchedulingError::Database("invalid SQL query".into()),
            other => SchedulingError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_scheduling())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → SchedulingError */
/* -------------------------------------------------------------------------- */

impl IntoSchedulingError for StorageError {
    fn into_scheduling(self) -> SchedulingError {
        match self {
            StorageError::Rusqlite(err) => err.into_scheduling(),
            StorageError::PoolExhausted => {
                SchedulingError::Database("connection pool exhausted".into())
            }
            StorageError::Timeout(msg) => {
                SchedulingError::Database(format!("storage timeout: {msg}"))
            }
            StorageError::InvalidConfig(msg) => SchedulingError::Config(msg),
            other => SchedulingError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_scheduling())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SchedulingError */
/* -------------------------------------------------------------------------- */

impl IntoSchedulingError for HttpError {
    fn into_scheduling(self) -> SchedulingError {
        if self.is_timeout() {
            return SchedulingError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SchedulingError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SchedulingError::Unauthorized(message),
                404 => SchedulingError::NotFound(message),
                400..=499 => SchedulingError::InvalidInput(message),
                _ => SchedulingError::Network(message),
            };
        }

        SchedulingError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_scheduling())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
