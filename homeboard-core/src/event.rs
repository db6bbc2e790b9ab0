//! A materialized event imported from a calendar source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An occurrence or series mirrored from the remote calendar.
///
/// Uniquely identified per calendar source by `external_id` when present.
/// Events created locally first (from the display) get their `external_id`
/// once the provider acknowledges the insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub calendar_source_id: Uuid,
    pub external_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub all_day: bool,
    pub recurrence_rule: Option<String>,
    /// Raw provider payload, kept opaque for debugging and future fields.
    pub raw: Option<serde_json::Value>,
}
