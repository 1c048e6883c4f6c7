//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SLOTBOOK_DB_PATH`: Database file path
//! - `SLOTBOOK_DB_POOL_SIZE`: Connection pool size
//! - `SLOTBOOK_MAX_HORIZON_DAYS`: Furthest bookable date, in days from now
//! - `SLOTBOOK_SLOT_LOCK_TTL_SECS`: Advisory slot lock lifetime in seconds
//! - `SLOTBOOK_CALENDAR_SYNC_URL`: Calendar sync endpoint (optional)
//! - `SLOTBOOK_EMAIL_DISPATCH_URL`: Email dispatch endpoint (optional)
//! - `SLOTBOOK_NOTIFICATIONS_ENABLED`: Whether notifications fire (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./slotbook.json` or `./slotbook.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use slotbook_domain::{
    BookingConfig, Config, DatabaseConfig, NotificationConfig, Result, SchedulingError,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SchedulingError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `SLOTBOOK_DB_PATH` and `SLOTBOOK_DB_POOL_SIZE` are required; booking
/// policy and notification variables fall back to defaults.
///
/// # Errors
/// Returns `SchedulingError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let db_path = env_var("SLOTBOOK_DB_PATH")?;
    let db_pool_size = env_var("SLOTBOOK_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| SchedulingError::Config(format!("Invalid pool size: {e}")))
    })?;

    let max_horizon_days =
        env_parse("SLOTBOOK_MAX_HORIZON_DAYS", defaults.booking.max_horizon_days)?;
    let slot_lock_ttl_secs =
        env_parse("SLOTBOOK_SLOT_LOCK_TTL_SECS", defaults.booking.slot_lock_ttl_secs)?;

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        booking: BookingConfig { max_horizon_days, slot_lock_ttl_secs },
        notifications: NotificationConfig {
            calendar_sync_url: std::env::var("SLOTBOOK_CALENDAR_SYNC_URL").ok(),
            email_dispatch_url: std::env::var("SLOTBOOK_EMAIL_DISPATCH_URL").ok(),
            enabled: env_bool("SLOTBOOK_NOTIFICATIONS_ENABLED", true),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SchedulingError::Config` if no file is found, the format is
/// invalid, or required fields are missing.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SchedulingError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SchedulingError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SchedulingError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SchedulingError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SchedulingError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SchedulingError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, up to two parent levels, and the
/// executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("slotbook.json"),
            cwd.join("slotbook.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("slotbook.json"),
                exe_dir.join("slotbook.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SchedulingError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric environment variable with a default.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| SchedulingError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_env() {
        for key in [
            "SLOTBOOK_DB_PATH",
            "SLOTBOOK_DB_POOL_SIZE",
            "SLOTBOOK_MAX_HORIZON_DAYS",
            "SLOTBOOK_SLOT_LOCK_TTL_SECS",
            "SLOTBOOK_CALENDAR_SYNC_URL",
            "SLOTBOOK_EMAIL_DISPATCH_URL",
            "SLOTBOOK_NOTIFICATIONS_ENABLED",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_BOOL_TRUE", "yes");
        std::env::set_var("TEST_BOOL_FALSE", "off");
        assert!(env_bool("TEST_BOOL_TRUE", false));
        assert!(!env_bool("TEST_BOOL_FALSE", true));

        std::env::remove_var("TEST_BOOL_MISSING");
        assert!(env_bool("TEST_BOOL_MISSING", true));
        assert!(!env_bool("TEST_BOOL_MISSING", false));

        std::env::remove_var("TEST_BOOL_TRUE");
        std::env::remove_var("TEST_BOOL_FALSE");
    }

    #[test]
    fn load_from_env_with_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SLOTBOOK_DB_PATH", "/tmp/slotbook.db");
        std::env::set_var("SLOTBOOK_DB_POOL_SIZE", "5");

        let config = load_from_env().expect("config loads");
        assert_eq!(config.database.path, "/tmp/slotbook.db");
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.booking.max_horizon_days, 60);
        assert_eq!(config.booking.slot_lock_ttl_secs, 120);
        assert!(config.notifications.enabled);
        assert!(config.notifications.calendar_sync_url.is_none());

        clear_env();
    }

    #[test]
    fn load_from_env_overrides_booking_policy() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SLOTBOOK_DB_PATH", "/tmp/slotbook.db");
        std::env::set_var("SLOTBOOK_DB_POOL_SIZE", "5");
        std::env::set_var("SLOTBOOK_MAX_HORIZON_DAYS", "14");
        std::env::set_var("SLOTBOOK_CALENDAR_SYNC_URL", "http://localhost:9000/sync");

        let config = load_from_env().expect("config loads");
        assert_eq!(config.booking.max_horizon_days, 14);
        assert_eq!(
            config.notifications.calendar_sync_url.as_deref(),
            Some("http://localhost:9000/sync")
        );

        clear_env();
    }

    #[test]
    fn load_from_env_missing_required_fails() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().expect_err("missing vars");
        assert!(matches!(err, SchedulingError::Config(_)));
    }

    #[test]
    fn load_from_toml_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        let mut file = NamedTempFile::with_suffix(".toml").expect("temp file");
        writeln!(
            file,
            r#"
[database]
path = "/tmp/slotbook.db"
pool_size = 4

[booking]
max_horizon_days = 30
slot_lock_ttl_secs = 90

[notifications]
enabled = false
"#
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config loads");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.booking.max_horizon_days, 30);
        assert!(!config.notifications.enabled);
    }

    #[test]
    fn load_from_json_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        let mut file = NamedTempFile::with_suffix(".json").expect("temp file");
        write!(
            file,
            r#"{{
                "database": {{"path": "/tmp/slotbook.db", "pool_size": 2}},
                "booking": {{"max_horizon_days": 60, "slot_lock_ttl_secs": 120}},
                "notifications": {{"calendar_sync_url": null, "email_dispatch_url": null, "enabled": true}}
            }}"#
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config loads");
        assert_eq!(config.database.pool_size, 2);
    }

    #[test]
    fn missing_file_fails() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/config.toml")))
            .expect_err("missing file");
        assert!(matches!(err, SchedulingError::Config(_)));
    }
}
