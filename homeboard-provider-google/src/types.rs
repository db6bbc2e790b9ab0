//! Wire types for the Calendar v3 REST API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of an event: `date` for all-day events, `date_time`
/// otherwise. Exactly one is set in well-formed payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl GoogleEventTime {
    pub fn all_day(date: NaiveDate) -> Self {
        GoogleEventTime {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn timed(date_time: DateTime<Utc>) -> Self {
        GoogleEventTime {
            date_time: Some(date_time),
            ..Default::default()
        }
    }

    /// Resolve to a concrete UTC instant; all-day dates become midnight UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .or_else(|| self.date.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc()))
    }

    pub fn is_all_day(&self) -> bool {
        self.date.is_some() && self.date_time.is_none()
    }
}

/// An event as returned by the events list/insert endpoints. Cancelled
/// items carry only `id` and `status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleEvent {
    pub id: String,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<GoogleEventTime>,
    pub end: Option<GoogleEventTime>,
    pub recurrence: Option<Vec<String>>,
    pub updated: Option<DateTime<Utc>>,
}

impl GoogleEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

/// Body for inserting a new event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: GoogleEventTime,
    pub end: GoogleEventTime,
}

/// One page of an events listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsPage {
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
}

/// All changed items accumulated across a (possibly paged) listing, plus
/// the sync token to persist for the next incremental fetch.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub items: Vec<GoogleEvent>,
    pub next_sync_token: Option<String>,
}

/// An entry from the user's calendar list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarListEntry {
    pub id: String,
    pub summary: String,
    pub primary: bool,
    pub background_color: Option<String>,
}

/// A registered push channel, as acknowledged by the provider.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    pub resource_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}
