//! A registered push-notification subscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider-side push channel watching one calendar source's event feed.
///
/// `channel_id` is generated locally at registration time; `resource_id` and
/// the expiration are assigned by the provider. Channels must be renewed
/// before `expires_at` lapses or change notifications stop arriving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookChannel {
    pub id: Uuid,
    pub calendar_source_id: Uuid,
    pub channel_id: String,
    pub resource_id: String,
    pub expires_at: DateTime<Utc>,
}
