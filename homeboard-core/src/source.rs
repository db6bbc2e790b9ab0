//! A connected remote calendar, scoped to a household.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One connected remote calendar.
///
/// `access_token` holds a vault-encrypted JSON bundle (access token plus its
/// expiry); `refresh_token` holds the vault-encrypted refresh token. A source
/// with a null `sync_token` triggers a full (non-incremental) fetch on its
/// next sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSource {
    pub id: Uuid,
    pub household_id: Uuid,
    pub provider: String,
    pub google_calendar_id: String,
    pub name: String,
    pub color: Option<String>,
    pub enabled: bool,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub sync_token: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl CalendarSource {
    /// Automated sync requires a refresh token; without one the source can
    /// only be used until its current access token lapses.
    pub fn can_auto_sync(&self) -> bool {
        self.enabled && self.refresh_token.is_some()
    }
}
