//! Wall-clock implementation of the Clock port.

use chrono::{DateTime, Utc};
use slotbook_core::Clock;

/// System clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
