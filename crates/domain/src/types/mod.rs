//! Domain types and models

pub mod availability;
pub mod event_type;
pub mod host;
pub mod meeting;
pub mod slots;

pub use availability::AvailabilityRule;
pub use event_type::{EventType, GroupEventType, LocationType};
pub use host::HostProfile;
pub use meeting::{
    BookingOperation, Meeting, MeetingParticipant, MeetingStatus, NewParticipant, SlotLock,
};
pub use slots::TimeSlot;
