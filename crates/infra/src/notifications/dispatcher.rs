//! HTTP booking event dispatcher

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use slotbook_core::BookingNotifier;
use slotbook_domain::{BookingOperation, NotificationConfig, Result, SchedulingError};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::InfraError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Booking event payload posted to each endpoint.
#[derive(Debug, Serialize)]
struct BookingEvent<'a> {
    meeting_id: Uuid,
    operation: &'a str,
}

/// Notifier that POSTs booking events to the configured HTTP endpoints.
///
/// Each configured endpoint receives the same JSON payload. Endpoints fail
/// independently: one endpoint being down does not stop delivery to the
/// other, and the notifier only errors when every delivery failed.
pub struct HttpBookingNotifier {
    client: reqwest::Client,
    config: NotificationConfig,
}

impl HttpBookingNotifier {
    /// Build a notifier from the notification section of the app config.
    ///
    /// # Errors
    /// Returns `SchedulingError::Network` if the HTTP client cannot be built.
    pub fn new(config: NotificationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SchedulingError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoints(&self) -> Vec<(&'static str, &str)> {
        let mut endpoints = Vec::new();
        if let Some(url) = self.config.calendar_sync_url.as_deref() {
            endpoints.push(("calendar_sync", url));
        }
        if let Some(url) = self.config.email_dispatch_url.as_deref() {
            endpoints.push(("email_dispatch", url));
        }
        endpoints
    }

    async fn post_event(&self, url: &str, event: &BookingEvent<'_>) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(event)
            .send()
            .await
            .map_err(|e| SchedulingError::from(InfraError::from(e)))?;

        response
            .error_for_status()
            .map_err(|e| SchedulingError::from(InfraError::from(e)))?;

        Ok(())
    }
}

#[async_trait]
impl BookingNotifier for HttpBookingNotifier {
    #[instrument(skip(self), fields(%meeting_id, operation = operation.as_str()))]
    async fn notify(&self, meeting_id: Uuid, operation: BookingOperation) -> Result<()> {
        if !self.config.enabled {
            debug!("Notifications disabled, skipping dispatch");
            return Ok(());
        }

        let endpoints = self.endpoints();
        if endpoints.is_empty() {
            debug!("No notification endpoints configured");
            return Ok(());
        }

        let event = BookingEvent { meeting_id, operation: operation.as_str() };

        let mut delivered = 0usize;
        let mut last_error = None;
        for (name, url) in &endpoints {
            match self.post_event(url, &event).await {
                Ok(()) => {
                    debug!(endpoint = name, "Booking event delivered");
                    delivered += 1;
                }
                Err(e) => {
                    warn!(endpoint = name, error = %e, "Booking event delivery failed");
                    last_error = Some(e);
                }
            }
        }

        match (delivered, last_error) {
            (0, Some(e)) => Err(e),
            _ => Ok(()),
        }
    }
}
