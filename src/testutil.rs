//! Shared fakes for tests: a scripted provider API and fixture builders.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use homeboard_core::{CalendarSource, Vault};
use homeboard_provider_google::{
    CalendarListEntry, ChangeSet, ChannelHandle, EventPayload, GoogleApiResult, GoogleEvent,
    GoogleEventTime, TokenBundle, ValidAccess,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

use crate::provider::CalendarApi;
use crate::tokens::encrypt_tokens;

/// Scripted [`CalendarApi`]: queued responses are popped per call, and calls
/// are recorded for assertions. Unscripted calls succeed with inert
/// defaults.
#[derive(Default)]
pub struct FakeApi {
    ensure_results: Mutex<VecDeque<GoogleApiResult<ValidAccess>>>,
    change_results: Mutex<VecDeque<GoogleApiResult<ChangeSet>>>,
    watch_results: Mutex<VecDeque<GoogleApiResult<ChannelHandle>>>,
    exchange_results: Mutex<VecDeque<GoogleApiResult<TokenBundle>>>,
    list_calls: Mutex<Vec<Option<String>>>,
    watch_calls: Mutex<Vec<String>>,
    stop_calls: Mutex<Vec<(String, String)>>,
    calendars: Mutex<Vec<CalendarListEntry>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ensure(&self, result: GoogleApiResult<ValidAccess>) {
        self.ensure_results.lock().unwrap().push_back(result);
    }

    pub fn push_changes(&self, result: GoogleApiResult<ChangeSet>) {
        self.change_results.lock().unwrap().push_back(result);
    }

    pub fn push_watch(&self, result: GoogleApiResult<ChannelHandle>) {
        self.watch_results.lock().unwrap().push_back(result);
    }

    pub fn push_exchange(&self, result: GoogleApiResult<TokenBundle>) {
        self.exchange_results.lock().unwrap().push_back(result);
    }

    pub fn set_calendars(&self, calendars: Vec<CalendarListEntry>) {
        *self.calendars.lock().unwrap() = calendars;
    }

    /// Sync tokens passed to `list_changed_events`, in call order.
    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn watch_calls(&self) -> Vec<String> {
        self.watch_calls.lock().unwrap().clone()
    }

    /// `(channel_id, resource_id)` pairs passed to `stop_channel`.
    pub fn stop_calls(&self) -> Vec<(String, String)> {
        self.stop_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarApi for FakeApi {
    fn auth_url(&self, state: &str) -> String {
        format!("https://accounts.google.com/o/oauth2/v2/auth?state={state}")
    }

    async fn exchange_code(&self, _code: &str) -> GoogleApiResult<TokenBundle> {
        if let Some(result) = self.exchange_results.lock().unwrap().pop_front() {
            return result;
        }
        Ok(TokenBundle {
            access_token: "exchanged-access".to_string(),
            refresh_token: Some("exchanged-refresh".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }

    async fn ensure_valid(&self, tokens: &TokenBundle) -> GoogleApiResult<ValidAccess> {
        if let Some(result) = self.ensure_results.lock().unwrap().pop_front() {
            return result;
        }
        Ok(ValidAccess {
            access_token: tokens.access_token.clone(),
            rotated: None,
        })
    }

    async fn list_calendars(&self, _access_token: &str) -> GoogleApiResult<Vec<CalendarListEntry>> {
        Ok(self.calendars.lock().unwrap().clone())
    }

    async fn list_changed_events(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        sync_token: Option<&str>,
    ) -> GoogleApiResult<ChangeSet> {
        self.list_calls
            .lock()
            .unwrap()
            .push(sync_token.map(String::from));

        match self.change_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(ChangeSet::default()),
        }
    }

    async fn insert_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        payload: &EventPayload,
    ) -> GoogleApiResult<GoogleEvent> {
        Ok(GoogleEvent {
            id: format!("remote-{}", Uuid::new_v4()),
            status: Some("confirmed".to_string()),
            summary: Some(payload.summary.clone()),
            description: payload.description.clone(),
            location: payload.location.clone(),
            start: Some(payload.start.clone()),
            end: Some(payload.end.clone()),
            recurrence: None,
            updated: Some(Utc::now()),
        })
    }

    async fn watch_events(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        channel_id: &str,
        _address: &str,
    ) -> GoogleApiResult<ChannelHandle> {
        self.watch_calls.lock().unwrap().push(channel_id.to_string());

        match self.watch_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(ChannelHandle {
                resource_id: "resource-1".to_string(),
                expires_at: Some(Utc::now() + Duration::days(7)),
            }),
        }
    }

    async fn stop_channel(
        &self,
        _access_token: &str,
        channel_id: &str,
        resource_id: &str,
    ) -> GoogleApiResult<()> {
        self.stop_calls
            .lock()
            .unwrap()
            .push((channel_id.to_string(), resource_id.to_string()));
        Ok(())
    }
}

/// A connected, enabled calendar source with freshly encrypted tokens.
pub fn test_source(vault: &Vault, sync_token: Option<&str>) -> CalendarSource {
    let bundle = TokenBundle {
        access_token: "test-access".to_string(),
        refresh_token: Some("test-refresh".to_string()),
        expires_at: Some(Utc::now() + Duration::hours(1)),
    };
    let (access_token, refresh_token) =
        encrypt_tokens(vault, &bundle).expect("encrypting test tokens");

    CalendarSource {
        id: Uuid::new_v4(),
        household_id: Uuid::new_v4(),
        provider: "google".to_string(),
        google_calendar_id: "family@group.calendar.google.com".to_string(),
        name: "Family".to_string(),
        color: Some("#4285f4".to_string()),
        enabled: true,
        access_token,
        refresh_token,
        sync_token: sync_token.map(String::from),
        last_synced_at: None,
    }
}

/// A confirmed timed event as the provider would return it.
pub fn remote_event(id: &str, summary: &str) -> GoogleEvent {
    let starts_at = Utc::now() + Duration::days(1);

    GoogleEvent {
        id: id.to_string(),
        status: Some("confirmed".to_string()),
        summary: Some(summary.to_string()),
        description: None,
        location: None,
        start: Some(GoogleEventTime::timed(starts_at)),
        end: Some(GoogleEventTime::timed(starts_at + Duration::hours(1))),
        recurrence: None,
        updated: Some(Utc::now()),
    }
}

/// Application state wired to a fresh memory store and fake API, for route
/// handler tests. Returns the shared fakes alongside so tests can script
/// and inspect them.
pub fn test_state() -> (
    crate::state::AppState,
    std::sync::Arc<crate::store::memory::MemoryStore>,
    std::sync::Arc<FakeApi>,
) {
    use std::sync::Arc;

    let config = crate::config::Config {
        port: 0,
        supabase_url: "http://localhost:54321".to_string(),
        supabase_service_key: "service-key".to_string(),
        google_client_id: "client-id".to_string(),
        google_client_secret: "client-secret".to_string(),
        google_redirect_uri: "https://homeboard.example/api/auth/google/callback".to_string(),
        token_encryption_secret: "test-secret".to_string(),
        cron_secret: "cron-secret".to_string(),
        public_base_url: "https://homeboard.example".to_string(),
    };

    let store = Arc::new(crate::store::memory::MemoryStore::new());
    let api = Arc::new(FakeApi::new());
    let vault = Vault::new(&config.token_encryption_secret).unwrap();
    let rate_limiter = Arc::new(crate::rate_limit::SlidingWindowLimiter::for_sync());

    let state = crate::state::AppState::new(
        config,
        Arc::clone(&store) as Arc<dyn crate::store::Store>,
        Arc::clone(&api) as Arc<dyn CalendarApi>,
        vault,
        rate_limiter,
    );

    (state, store, api)
}
