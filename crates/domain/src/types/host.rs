//! Host profile types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Host profile stored alongside availability rules.
///
/// The `timezone` is an IANA identifier (e.g. `America/New_York`) and drives
/// the projection of wall-clock availability rules into UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostProfile {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub email: String,
    pub timezone: String,
}
