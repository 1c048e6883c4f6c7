//! Application context - dependency injection container

use std::sync::Arc;

use chrono::Duration;
use slotbook_core::{
    AvailabilityRepository, BookingNotifier, BookingService, Clock, EventTypeRepository,
    HostDirectory, MeetingLedger, ParticipantTokenVerifier, SlotCalculator, SlotLockRepository,
};
use slotbook_domain::{Config, Result};
use slotbook_infra::{
    DbManager, HttpBookingNotifier, SqliteAvailabilityRepository, SqliteEventTypeRepository,
    SqliteHostDirectory, SqliteMeetingLedger, SqliteSlotLockRepository, SystemClock,
};
use tracing::info;

/// Application context - holds the wired services and repositories.
///
/// Built once at startup from [`Config`]; commands borrow it for the
/// lifetime of the process. The SQLite ledger doubles as the participant
/// token verifier, so one repository instance backs both ports.
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub slot_calculator: Arc<SlotCalculator>,
    pub booking_service: Arc<BookingService>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub event_types: Arc<dyn EventTypeRepository>,
    pub hosts: Arc<SqliteHostDirectory>,
}

impl AppContext {
    /// Build the full context from configuration: open the database, apply
    /// the schema, and wire every service.
    ///
    /// # Errors
    /// Returns `Database` if the pool or schema cannot be set up, `Network`
    /// if the notification client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let db = DbManager::new(&config.database.path, config.database.pool_size)?;
        Self::with_database(config, db)
    }

    /// Build the context over an already-created database manager. Tests use
    /// this with in-memory or temp-file databases.
    ///
    /// # Errors
    /// Returns `Database` if the schema cannot be applied, `Network` if the
    /// notification client cannot be built.
    pub fn with_database(config: Config, db: DbManager) -> Result<Self> {
        db.run_migrations()?;
        let db = Arc::new(db);
        let pool = Arc::clone(db.pool());

        let availability: Arc<dyn AvailabilityRepository> =
            Arc::new(SqliteAvailabilityRepository::new(Arc::clone(&pool)));
        let event_types: Arc<dyn EventTypeRepository> =
            Arc::new(SqliteEventTypeRepository::new(Arc::clone(&pool)));
        let hosts = Arc::new(SqliteHostDirectory::new(Arc::clone(&pool)));
        let ledger = Arc::new(SqliteMeetingLedger::new(Arc::clone(&pool)));
        let locks: Arc<dyn SlotLockRepository> =
            Arc::new(SqliteSlotLockRepository::new(Arc::clone(&pool)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let notifier: Arc<dyn BookingNotifier> =
            Arc::new(HttpBookingNotifier::new(config.notifications.clone())?);

        let host_directory: Arc<dyn HostDirectory> = Arc::clone(&hosts) as Arc<dyn HostDirectory>;
        let meeting_ledger: Arc<dyn MeetingLedger> =
            Arc::clone(&ledger) as Arc<dyn MeetingLedger>;
        let tokens: Arc<dyn ParticipantTokenVerifier> =
            Arc::clone(&ledger) as Arc<dyn ParticipantTokenVerifier>;

        let slot_calculator = Arc::new(
            SlotCalculator::new(
                Arc::clone(&event_types),
                Arc::clone(&availability),
                Arc::clone(&host_directory),
                Arc::clone(&meeting_ledger),
                Arc::clone(&clock),
            )
            .with_max_horizon_days(config.booking.max_horizon_days),
        );

        let booking_service = Arc::new(
            BookingService::new(
                Arc::clone(&event_types),
                host_directory,
                meeting_ledger,
                locks,
                tokens,
                notifier,
                clock,
            )
            .with_lock_ttl(Duration::seconds(config.booking.slot_lock_ttl_secs)),
        );

        info!(db_path = %db.path().display(), "Application context initialised");

        Ok(Self { config, db, slot_calculator, booking_service, availability, event_types, hosts })
    }

    /// Verify the context is serviceable (database reachable).
    ///
    /// # Errors
    /// Returns `Database` if the probe query fails.
    pub fn health_check(&self) -> Result<()> {
        self.db.health_check()
    }
}
