//! # Slotbook Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Availability resolution (slot calculation, group intersection)
//! - Booking orchestration (lock, book, reschedule, cancel)
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `slotbook-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod scheduling;

// Re-export specific items to avoid ambiguity
pub use scheduling::booking::{
    Actor, BookGroupMeetingRequest, BookMeetingRequest, BookingService,
};
pub use scheduling::ports::{
    AvailabilityRepository, BookingInsert, BookingNotifier, Clock, ConflictCheck,
    DailyLimitCheck, EventTypeRepository, GroupBookingInsert, HostDirectory, HostParticipant,
    LimitScope, MeetingLedger, ParticipantTokenVerifier, SlotLockRepository,
};
pub use scheduling::slots::SlotCalculator;
