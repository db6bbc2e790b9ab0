//! Calendar v3 REST calls: calendar list, event listing with sync tokens,
//! event insertion, push channel watch/stop.

use crate::auth::GoogleCredentials;
use crate::error::{GoogleApiError, GoogleApiResult};
use crate::types::{
    CalendarListEntry, ChangeSet, ChannelHandle, EventPayload, EventsPage, GoogleEvent,
};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Page size for event listings. Google caps at 2500; 250 keeps response
/// bodies small while still draining most calendars in a page or two.
const PAGE_SIZE: &str = "250";

/// A Google Calendar API client bound to one OAuth application.
///
/// Access tokens are passed per call: one client serves every calendar
/// source in the household regardless of which Google account owns it.
#[derive(Clone)]
pub struct GoogleClient {
    pub(crate) credentials: GoogleCredentials,
    pub(crate) http: reqwest::Client,
}

impl GoogleClient {
    pub fn new(credentials: GoogleCredentials) -> Self {
        GoogleClient {
            credentials,
            http: reqwest::Client::new(),
        }
    }

    /// Fetch the authorizing user's calendar list.
    pub async fn list_calendars(&self, access_token: &str) -> GoogleApiResult<Vec<CalendarListEntry>> {
        #[derive(Deserialize, Default)]
        struct CalendarList {
            #[serde(default)]
            items: Vec<CalendarListEntry>,
        }

        let response = self
            .http
            .get(format!("{API_BASE}/users/me/calendarList"))
            .bearer_auth(access_token)
            .send()
            .await?;

        let list: CalendarList = Self::read_json(response).await?;
        Ok(list.items.into_iter().filter(|c| !c.id.is_empty()).collect())
    }

    /// List changed events for a calendar, following pagination to the end.
    ///
    /// With a sync token only deltas since that token are returned; without
    /// one this is a full listing. A stale token is reported as
    /// [`GoogleApiError::SyncTokenInvalid`] (HTTP 410) so the caller can
    /// clear its cursor and fall back to a full fetch.
    pub async fn list_changed_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        sync_token: Option<&str>,
    ) -> GoogleApiResult<ChangeSet> {
        let url = format!(
            "{API_BASE}/calendars/{}/events",
            urlencode_path(calendar_id)
        );

        let mut change_set = ChangeSet::default();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> =
                vec![("maxResults", PAGE_SIZE), ("showDeleted", "true")];
            if let Some(token) = sync_token {
                query.push(("syncToken", token));
            }
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await?;

            // 410 GONE: the sync token has been invalidated server-side
            if response.status() == StatusCode::GONE {
                return Err(GoogleApiError::SyncTokenInvalid);
            }

            let page: EventsPage = Self::read_json(response).await?;
            change_set.items.extend(page.items);

            if page.next_sync_token.is_some() {
                change_set.next_sync_token = page.next_sync_token;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(change_set)
    }

    /// Create a new event on the remote calendar.
    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> GoogleApiResult<GoogleEvent> {
        let response = self
            .http
            .post(format!(
                "{API_BASE}/calendars/{}/events",
                urlencode_path(calendar_id)
            ))
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Register a push-notification channel against the calendar's event
    /// feed. Change notifications will POST to `address`.
    pub async fn watch_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        channel_id: &str,
        address: &str,
    ) -> GoogleApiResult<ChannelHandle> {
        #[derive(Deserialize, Default)]
        #[serde(rename_all = "camelCase", default)]
        struct WatchResponse {
            resource_id: String,
            // Milliseconds since epoch, as a string
            expiration: Option<String>,
        }

        let response = self
            .http
            .post(format!(
                "{API_BASE}/calendars/{}/events/watch",
                urlencode_path(calendar_id)
            ))
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "id": channel_id,
                "type": "web_hook",
                "address": address,
            }))
            .send()
            .await?;

        let watch: WatchResponse = Self::read_json(response).await?;

        if watch.resource_id.is_empty() {
            return Err(GoogleApiError::Malformed(
                "watch response missing resourceId".into(),
            ));
        }

        Ok(ChannelHandle {
            resource_id: watch.resource_id,
            expires_at: watch.expiration.and_then(parse_expiration_millis),
        })
    }

    /// Deregister a push channel. "Already gone" responses (404/410) are
    /// treated as success so teardown of a lapsed channel doesn't fail.
    pub async fn stop_channel(
        &self,
        access_token: &str,
        channel_id: &str,
        resource_id: &str,
    ) -> GoogleApiResult<()> {
        let response = self
            .http
            .post(format!("{API_BASE}/channels/stop"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "id": channel_id,
                "resourceId": resource_id,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success()
            || status == StatusCode::NOT_FOUND
            || status == StatusCode::GONE
        {
            return Ok(());
        }

        Err(GoogleApiError::Api {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> GoogleApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str().map(String::from))
                })
                .unwrap_or(body);

            // 401 on an API call means the access token was rejected outright
            if status == StatusCode::UNAUTHORIZED {
                return Err(GoogleApiError::TokenRevoked);
            }

            return Err(GoogleApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

fn parse_expiration_millis(millis: String) -> Option<DateTime<Utc>> {
    millis
        .parse::<i64>()
        .ok()
        .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms))
}

/// Calendar ids contain `@` and `#`; encode them for use in a URL path.
fn urlencode_path(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}
