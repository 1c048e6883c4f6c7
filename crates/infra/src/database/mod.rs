//! SQLite implementations of the scheduling ports

pub mod availability_repository;
pub mod event_type_repository;
pub mod host_repository;
pub mod manager;
pub mod meeting_repository;
pub mod slot_lock_repository;

pub use availability_repository::SqliteAvailabilityRepository;
pub use event_type_repository::SqliteEventTypeRepository;
pub use host_repository::SqliteHostDirectory;
pub use manager::DbManager;
pub use meeting_repository::SqliteMeetingLedger;
pub use slot_lock_repository::SqliteSlotLockRepository;
