//! Error types used throughout the scheduling engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for slotbook
///
/// Booking clients branch on the variant: `SlotConflict` prompts a re-fetch
/// of slots, `NoticeViolation` and `DailyLimitExceeded` explain the host's
/// constraint, everything else is surfaced as a retryable failure.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SchedulingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Slot no longer available: {0}")]
    SlotConflict(String),

    #[error("Inside minimum notice window: {0}")]
    NoticeViolation(String),

    #[error("Daily booking limit reached: {0}")]
    DailyLimitExceeded(String),

    #[error("Invalid meeting state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for slotbook operations
pub type Result<T> = std::result::Result<T, SchedulingError>;
