//! Typed access to the relational store.
//!
//! The store is an external collaborator; this trait exposes only the table
//! operations the core needs (filter/upsert/delete primitives over named
//! tables). Production uses [`rest::RestStore`] against the Supabase
//! PostgREST API; tests use an in-memory implementation.

pub mod rest;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homeboard_core::{CalendarSource, Chore, ChoreAssignment, Event, HomeboardResult, WebhookChannel};
use uuid::Uuid;

#[async_trait]
pub trait Store: Send + Sync {
    // calendar_sources

    async fn calendar_source(&self, id: Uuid) -> HomeboardResult<Option<CalendarSource>>;

    async fn calendar_sources_for_household(
        &self,
        household_id: Uuid,
    ) -> HomeboardResult<Vec<CalendarSource>>;

    async fn enabled_calendar_sources(&self) -> HomeboardResult<Vec<CalendarSource>>;

    /// Insert or, when the household already has a row for this remote
    /// calendar, update it in place (re-connect refreshes tokens).
    async fn upsert_calendar_source(&self, source: &CalendarSource) -> HomeboardResult<()>;

    async fn update_source_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> HomeboardResult<()>;

    /// Persist the sync cursor and advance the last-synced timestamp. Must
    /// succeed even when nothing else changed so staleness scheduling moves.
    async fn update_source_cursor(
        &self,
        id: Uuid,
        sync_token: Option<&str>,
        last_synced_at: DateTime<Utc>,
    ) -> HomeboardResult<()>;

    async fn set_source_enabled(&self, id: Uuid, enabled: bool) -> HomeboardResult<()>;

    /// Delete the source; its events and channels go with it.
    async fn delete_calendar_source(&self, id: Uuid) -> HomeboardResult<()>;

    // events

    /// Insert-or-update keyed on `(calendar_source_id, external_id)`.
    async fn upsert_event(&self, event: &Event) -> HomeboardResult<()>;

    async fn insert_event(&self, event: &Event) -> HomeboardResult<()>;

    /// Returns whether a matching row existed.
    async fn delete_event_by_external_id(
        &self,
        calendar_source_id: Uuid,
        external_id: &str,
    ) -> HomeboardResult<bool>;

    // webhook_channels

    async fn insert_webhook_channel(&self, channel: &WebhookChannel) -> HomeboardResult<()>;

    async fn delete_webhook_channel(&self, id: Uuid) -> HomeboardResult<()>;

    async fn webhook_channels_for_source(
        &self,
        calendar_source_id: Uuid,
    ) -> HomeboardResult<Vec<WebhookChannel>>;

    async fn webhook_channel_by_channel_id(
        &self,
        channel_id: &str,
    ) -> HomeboardResult<Option<WebhookChannel>>;

    async fn all_webhook_channels(&self) -> HomeboardResult<Vec<WebhookChannel>>;

    // chores

    async fn insert_chore(&self, chore: &Chore) -> HomeboardResult<()>;

    async fn chore(&self, id: Uuid) -> HomeboardResult<Option<Chore>>;

    async fn chore_assignment(&self, id: Uuid) -> HomeboardResult<Option<ChoreAssignment>>;

    async fn insert_chore_assignment(&self, assignment: &ChoreAssignment) -> HomeboardResult<()>;

    async fn update_chore_assignment(&self, assignment: &ChoreAssignment) -> HomeboardResult<()>;

    // users

    /// The household the user belongs to, if any.
    async fn household_for_user(&self, user_id: Uuid) -> HomeboardResult<Option<Uuid>>;
}
