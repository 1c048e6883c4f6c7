//! Outbound booking notifications
//!
//! Pushes booking lifecycle events to the configured calendar-sync and
//! email-dispatch endpoints. Delivery is best-effort: the booking service
//! treats notifier failures as non-fatal.

mod dispatcher;

pub use dispatcher::HttpBookingNotifier;
