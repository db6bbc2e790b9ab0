//! Seam between the sync core and the remote calendar provider.
//!
//! The engine, webhook manager, and routes talk to this trait; production
//! wires in the Google REST client, tests wire in a scripted fake.

use async_trait::async_trait;
use homeboard_provider_google::{
    CalendarListEntry, ChangeSet, ChannelHandle, EventPayload, GoogleApiResult, GoogleClient,
    GoogleEvent, TokenBundle, ValidAccess,
};

#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Consent URL for the OAuth dance, embedding the caller's CSRF state.
    fn auth_url(&self, state: &str) -> String;

    /// Trade an authorization code for the initial token bundle.
    async fn exchange_code(&self, code: &str) -> GoogleApiResult<TokenBundle>;

    /// Return a usable access token, refreshing if needed. A rotated bundle
    /// must be persisted by the caller before the token is used.
    async fn ensure_valid(&self, tokens: &TokenBundle) -> GoogleApiResult<ValidAccess>;

    async fn list_calendars(&self, access_token: &str) -> GoogleApiResult<Vec<CalendarListEntry>>;

    async fn list_changed_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        sync_token: Option<&str>,
    ) -> GoogleApiResult<ChangeSet>;

    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> GoogleApiResult<GoogleEvent>;

    async fn watch_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        channel_id: &str,
        address: &str,
    ) -> GoogleApiResult<ChannelHandle>;

    async fn stop_channel(
        &self,
        access_token: &str,
        channel_id: &str,
        resource_id: &str,
    ) -> GoogleApiResult<()>;
}

#[async_trait]
impl CalendarApi for GoogleClient {
    fn auth_url(&self, state: &str) -> String {
        GoogleClient::auth_url(self, state, homeboard_provider_google::SCOPES)
    }

    async fn exchange_code(&self, code: &str) -> GoogleApiResult<TokenBundle> {
        GoogleClient::exchange_code(self, code).await
    }

    async fn ensure_valid(&self, tokens: &TokenBundle) -> GoogleApiResult<ValidAccess> {
        GoogleClient::ensure_valid(self, tokens).await
    }

    async fn list_calendars(&self, access_token: &str) -> GoogleApiResult<Vec<CalendarListEntry>> {
        GoogleClient::list_calendars(self, access_token).await
    }

    async fn list_changed_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        sync_token: Option<&str>,
    ) -> GoogleApiResult<ChangeSet> {
        GoogleClient::list_changed_events(self, access_token, calendar_id, sync_token).await
    }

    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> GoogleApiResult<GoogleEvent> {
        GoogleClient::insert_event(self, access_token, calendar_id, payload).await
    }

    async fn watch_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        channel_id: &str,
        address: &str,
    ) -> GoogleApiResult<ChannelHandle> {
        GoogleClient::watch_events(self, access_token, calendar_id, channel_id, address).await
    }

    async fn stop_channel(
        &self,
        access_token: &str,
        channel_id: &str,
        resource_id: &str,
    ) -> GoogleApiResult<()> {
        GoogleClient::stop_channel(self, access_token, channel_id, resource_id).await
    }
}
