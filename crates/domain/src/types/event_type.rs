//! Bookable meeting templates

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_EVENT_DURATION_MINUTES, MIN_GROUP_HOSTS};
use crate::errors::{Result, SchedulingError};

/// Where a meeting of a given event type takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    InPerson,
    Phone,
    Video,
    Custom,
}

impl LocationType {
    /// Canonical string form as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPerson => "in_person",
            Self::Phone => "phone",
            Self::Video => "video",
            Self::Custom => "custom",
        }
    }

    /// Parse the stored string form.
    ///
    /// # Errors
    /// Returns `InvalidInput` for unrecognised values.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "in_person" => Ok(Self::InPerson),
            "phone" => Ok(Self::Phone),
            "video" => Ok(Self::Video),
            "custom" => Ok(Self::Custom),
            other => Err(SchedulingError::InvalidInput(format!(
                "unknown location type: {other}"
            ))),
        }
    }
}

/// A bookable meeting template owned by a single host.
///
/// `booking_link` is the guest-facing token: globally unique and immutable
/// once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventType {
    pub id: Uuid,
    pub host_user_id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub location_type: LocationType,
    pub location: Option<String>,
    pub buffer_before_minutes: u32,
    pub buffer_after_minutes: u32,
    pub minimum_notice_hours: u32,
    pub daily_limit: Option<u32>,
    pub booking_link: String,
    pub is_active: bool,
}

impl EventType {
    /// Validate the template invariants before it is persisted or used for
    /// slot calculation.
    ///
    /// # Errors
    /// Returns `InvalidInput` on a zero or absurd duration, or an empty
    /// booking link.
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes == 0 {
            return Err(SchedulingError::InvalidInput(
                "duration_minutes must be greater than zero".into(),
            ));
        }
        if self.duration_minutes > MAX_EVENT_DURATION_MINUTES {
            return Err(SchedulingError::InvalidInput(format!(
                "duration_minutes {} exceeds the maximum of {}",
                self.duration_minutes, MAX_EVENT_DURATION_MINUTES
            )));
        }
        if self.booking_link.trim().is_empty() {
            return Err(SchedulingError::InvalidInput("booking_link must not be empty".into()));
        }
        Ok(())
    }
}

/// An event type requiring multiple hosts to be simultaneously free.
///
/// Availability is the intersection of all hosts' free time; buffers and
/// minimum notice apply per host before intersection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEventType {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub location_type: LocationType,
    pub location: Option<String>,
    pub buffer_before_minutes: u32,
    pub buffer_after_minutes: u32,
    pub minimum_notice_hours: u32,
    pub daily_limit: Option<u32>,
    pub booking_link: String,
    pub is_active: bool,
    pub host_user_ids: Vec<Uuid>,
}

impl GroupEventType {
    /// Validate group invariants, including the minimum host count.
    ///
    /// # Errors
    /// Returns `InvalidInput` if fewer than two hosts are attached or the
    /// duration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes == 0 || self.duration_minutes > MAX_EVENT_DURATION_MINUTES {
            return Err(SchedulingError::InvalidInput(format!(
                "invalid duration_minutes: {}",
                self.duration_minutes
            )));
        }
        if self.host_user_ids.len() < MIN_GROUP_HOSTS {
            return Err(SchedulingError::InvalidInput(format!(
                "group event type requires at least {} hosts, got {}",
                MIN_GROUP_HOSTS,
                self.host_user_ids.len()
            )));
        }
        Ok(())
    }

    /// View of the group constraints as a per-host event type, used when
    /// computing one host's free intervals before intersection.
    pub fn as_host_event_type(&self, host_user_id: Uuid) -> EventType {
        EventType {
            id: self.id,
            host_user_id,
            name: self.name.clone(),
            duration_minutes: self.duration_minutes,
            location_type: self.location_type,
            location: self.location.clone(),
            buffer_before_minutes: self.buffer_before_minutes,
            buffer_after_minutes: self.buffer_after_minutes,
            minimum_notice_hours: self.minimum_notice_hours,
            daily_limit: self.daily_limit,
            booking_link: self.booking_link.clone(),
            is_active: self.is_active,
        }
    }
}
