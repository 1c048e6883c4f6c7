//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
    pub notifications: NotificationConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Booking policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Furthest date a guest may book ahead of now, in days
    pub max_horizon_days: i64,
    /// Advisory slot lock lifetime, in seconds
    pub slot_lock_ttl_secs: i64,
}

/// Outbound notification configuration
///
/// Endpoints are optional: a missing endpoint disables that collaborator
/// without affecting booking decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub calendar_sync_url: Option<String>,
    pub email_dispatch_url: Option<String>,
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "slotbook.db".to_string(), pool_size: 8 },
            booking: BookingConfig {
                max_horizon_days: crate::constants::MAX_BOOKING_HORIZON_DAYS,
                slot_lock_ttl_secs: crate::constants::SLOT_LOCK_TTL_SECS,
            },
            notifications: NotificationConfig {
                calendar_sync_url: None,
                email_dispatch_url: None,
                enabled: true,
            },
        }
    }
}
