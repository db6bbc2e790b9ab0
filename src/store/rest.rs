//! Supabase PostgREST-backed store implementation.
//!
//! Each trait method maps to one REST call with PostgREST filter syntax
//! (`column=eq.value`). The service-role key authenticates every request;
//! row-level security is enforced upstream for end-user clients, while this
//! process scopes queries by household itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homeboard_core::{
    CalendarSource, Chore, ChoreAssignment, Event, HomeboardError, HomeboardResult, WebhookChannel,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::Store;

pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl RestStore {
    pub fn new(supabase_url: &str, service_key: &str) -> Self {
        RestStore {
            http: reqwest::Client::new(),
            base_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            service_key: service_key.to_string(),
        }
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> HomeboardResult<Vec<T>> {
        let response = self
            .request(Method::GET, table)
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await
            .map_err(request_error)?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| HomeboardError::Store(format!("Invalid response from {table}: {e}")))
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> HomeboardResult<Option<T>> {
        Ok(self.fetch(table, filters).await?.into_iter().next())
    }

    async fn write(
        &self,
        method: Method,
        table: &str,
        filters: &[(&str, String)],
        body: Option<serde_json::Value>,
        prefer: Option<&str>,
    ) -> HomeboardResult<()> {
        let mut request = self.request(method, table).query(filters);
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(request_error)?;
        check_status(response).await?;
        Ok(())
    }

    fn eq(column: &'static str, value: impl ToString) -> (&'static str, String) {
        (column, format!("eq.{}", value.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> HomeboardResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HomeboardError::Store(format!(
        "Store request failed with {status}: {body}"
    )))
}

fn request_error(e: reqwest::Error) -> HomeboardError {
    HomeboardError::Store(format!("Store request failed: {e}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> HomeboardResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| HomeboardError::Serialization(e.to_string()))
}

/// Upsert bodies omit the primary key: on conflict the existing row keeps
/// its id (events and channels reference it), and on insert the database
/// default assigns one.
fn without_id(mut body: serde_json::Value) -> serde_json::Value {
    if let Some(object) = body.as_object_mut() {
        object.remove("id");
    }
    body
}

#[async_trait]
impl Store for RestStore {
    async fn calendar_source(&self, id: Uuid) -> HomeboardResult<Option<CalendarSource>> {
        self.fetch_one("calendar_sources", &[Self::eq("id", id)]).await
    }

    async fn calendar_sources_for_household(
        &self,
        household_id: Uuid,
    ) -> HomeboardResult<Vec<CalendarSource>> {
        self.fetch(
            "calendar_sources",
            &[Self::eq("household_id", household_id)],
        )
        .await
    }

    async fn enabled_calendar_sources(&self) -> HomeboardResult<Vec<CalendarSource>> {
        self.fetch("calendar_sources", &[Self::eq("enabled", "true")])
            .await
    }

    async fn upsert_calendar_source(&self, source: &CalendarSource) -> HomeboardResult<()> {
        self.write(
            Method::POST,
            "calendar_sources",
            &[("on_conflict", "household_id,google_calendar_id".to_string())],
            Some(without_id(to_json(source)?)),
            Some("resolution=merge-duplicates,return=minimal"),
        )
        .await
    }

    async fn update_source_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> HomeboardResult<()> {
        self.write(
            Method::PATCH,
            "calendar_sources",
            &[Self::eq("id", id)],
            Some(serde_json::json!({
                "access_token": access_token,
                "refresh_token": refresh_token,
            })),
            None,
        )
        .await
    }

    async fn update_source_cursor(
        &self,
        id: Uuid,
        sync_token: Option<&str>,
        last_synced_at: DateTime<Utc>,
    ) -> HomeboardResult<()> {
        self.write(
            Method::PATCH,
            "calendar_sources",
            &[Self::eq("id", id)],
            Some(serde_json::json!({
                "sync_token": sync_token,
                "last_synced_at": last_synced_at,
            })),
            None,
        )
        .await
    }

    async fn set_source_enabled(&self, id: Uuid, enabled: bool) -> HomeboardResult<()> {
        self.write(
            Method::PATCH,
            "calendar_sources",
            &[Self::eq("id", id)],
            Some(serde_json::json!({ "enabled": enabled })),
            None,
        )
        .await
    }

    async fn delete_calendar_source(&self, id: Uuid) -> HomeboardResult<()> {
        // Events and webhook channels cascade via their foreign keys
        self.write(
            Method::DELETE,
            "calendar_sources",
            &[Self::eq("id", id)],
            None,
            None,
        )
        .await
    }

    async fn upsert_event(&self, event: &Event) -> HomeboardResult<()> {
        self.write(
            Method::POST,
            "events",
            &[("on_conflict", "calendar_source_id,external_id".to_string())],
            Some(without_id(to_json(event)?)),
            Some("resolution=merge-duplicates,return=minimal"),
        )
        .await
    }

    async fn insert_event(&self, event: &Event) -> HomeboardResult<()> {
        self.write(
            Method::POST,
            "events",
            &[],
            Some(to_json(event)?),
            Some("return=minimal"),
        )
        .await
    }

    async fn delete_event_by_external_id(
        &self,
        calendar_source_id: Uuid,
        external_id: &str,
    ) -> HomeboardResult<bool> {
        let filters = [
            Self::eq("calendar_source_id", calendar_source_id),
            Self::eq("external_id", external_id),
        ];

        // Prefer: return=representation echoes deleted rows so we can tell
        // whether anything matched
        let response = self
            .request(Method::DELETE, "events")
            .query(&filters)
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(request_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let response = check_status(response).await?;
        let deleted: Vec<serde_json::Value> = response.json().await.unwrap_or_default();
        Ok(!deleted.is_empty())
    }

    async fn insert_webhook_channel(&self, channel: &WebhookChannel) -> HomeboardResult<()> {
        self.write(
            Method::POST,
            "webhook_channels",
            &[],
            Some(to_json(channel)?),
            Some("return=minimal"),
        )
        .await
    }

    async fn delete_webhook_channel(&self, id: Uuid) -> HomeboardResult<()> {
        self.write(
            Method::DELETE,
            "webhook_channels",
            &[Self::eq("id", id)],
            None,
            None,
        )
        .await
    }

    async fn webhook_channels_for_source(
        &self,
        calendar_source_id: Uuid,
    ) -> HomeboardResult<Vec<WebhookChannel>> {
        self.fetch(
            "webhook_channels",
            &[Self::eq("calendar_source_id", calendar_source_id)],
        )
        .await
    }

    async fn webhook_channel_by_channel_id(
        &self,
        channel_id: &str,
    ) -> HomeboardResult<Option<WebhookChannel>> {
        self.fetch_one("webhook_channels", &[Self::eq("channel_id", channel_id)])
            .await
    }

    async fn all_webhook_channels(&self) -> HomeboardResult<Vec<WebhookChannel>> {
        self.fetch("webhook_channels", &[]).await
    }

    async fn insert_chore(&self, chore: &Chore) -> HomeboardResult<()> {
        self.write(
            Method::POST,
            "chores",
            &[],
            Some(to_json(chore)?),
            Some("return=minimal"),
        )
        .await
    }

    async fn chore(&self, id: Uuid) -> HomeboardResult<Option<Chore>> {
        self.fetch_one("chores", &[Self::eq("id", id)]).await
    }

    async fn chore_assignment(&self, id: Uuid) -> HomeboardResult<Option<ChoreAssignment>> {
        self.fetch_one("chore_assignments", &[Self::eq("id", id)]).await
    }

    async fn insert_chore_assignment(&self, assignment: &ChoreAssignment) -> HomeboardResult<()> {
        self.write(
            Method::POST,
            "chore_assignments",
            &[],
            Some(to_json(assignment)?),
            Some("return=minimal"),
        )
        .await
    }

    async fn update_chore_assignment(&self, assignment: &ChoreAssignment) -> HomeboardResult<()> {
        self.write(
            Method::PATCH,
            "chore_assignments",
            &[Self::eq("id", assignment.id)],
            Some(to_json(assignment)?),
            None,
        )
        .await
    }

    async fn household_for_user(&self, user_id: Uuid) -> HomeboardResult<Option<Uuid>> {
        #[derive(Deserialize)]
        struct UserRow {
            household_id: Option<Uuid>,
        }

        let user: Option<UserRow> = self.fetch_one("users", &[Self::eq("id", user_id)]).await?;
        Ok(user.and_then(|u| u.household_id))
    }
}
