//! In-memory store used by tests in place of the REST backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homeboard_core::{
    CalendarSource, Chore, ChoreAssignment, Event, HomeboardResult, WebhookChannel,
};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::Store;

#[derive(Default)]
struct Inner {
    sources: Vec<CalendarSource>,
    events: Vec<Event>,
    channels: Vec<WebhookChannel>,
    chores: Vec<Chore>,
    assignments: Vec<ChoreAssignment>,
    users: HashMap<Uuid, Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&self, source: CalendarSource) {
        self.inner.lock().unwrap().sources.push(source);
    }

    pub fn add_channel(&self, channel: WebhookChannel) {
        self.inner.lock().unwrap().channels.push(channel);
    }

    pub fn add_chore(&self, chore: Chore) {
        self.inner.lock().unwrap().chores.push(chore);
    }

    pub fn add_assignment(&self, assignment: ChoreAssignment) {
        self.inner.lock().unwrap().assignments.push(assignment);
    }

    pub fn add_user(&self, user_id: Uuid, household_id: Uuid) {
        self.inner.lock().unwrap().users.insert(user_id, household_id);
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn channels(&self) -> Vec<WebhookChannel> {
        self.inner.lock().unwrap().channels.clone()
    }

    pub fn assignments(&self) -> Vec<ChoreAssignment> {
        self.inner.lock().unwrap().assignments.clone()
    }

    pub fn source(&self, id: Uuid) -> Option<CalendarSource> {
        self.inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn calendar_source(&self, id: Uuid) -> HomeboardResult<Option<CalendarSource>> {
        Ok(self.source(id))
    }

    async fn calendar_sources_for_household(
        &self,
        household_id: Uuid,
    ) -> HomeboardResult<Vec<CalendarSource>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .filter(|s| s.household_id == household_id)
            .cloned()
            .collect())
    }

    async fn enabled_calendar_sources(&self) -> HomeboardResult<Vec<CalendarSource>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect())
    }

    async fn upsert_calendar_source(&self, source: &CalendarSource) -> HomeboardResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.sources.iter_mut().find(|s| {
            s.household_id == source.household_id
                && s.google_calendar_id == source.google_calendar_id
        }) {
            *existing = source.clone();
        } else {
            inner.sources.push(source.clone());
        }
        Ok(())
    }

    async fn update_source_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> HomeboardResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.access_token = access_token.to_string();
            source.refresh_token = refresh_token.map(String::from);
        }
        Ok(())
    }

    async fn update_source_cursor(
        &self,
        id: Uuid,
        sync_token: Option<&str>,
        last_synced_at: DateTime<Utc>,
    ) -> HomeboardResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.sync_token = sync_token.map(String::from);
            source.last_synced_at = Some(last_synced_at);
        }
        Ok(())
    }

    async fn set_source_enabled(&self, id: Uuid, enabled: bool) -> HomeboardResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.enabled = enabled;
        }
        Ok(())
    }

    async fn delete_calendar_source(&self, id: Uuid) -> HomeboardResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.sources.retain(|s| s.id != id);
        inner.events.retain(|e| e.calendar_source_id != id);
        inner.channels.retain(|c| c.calendar_source_id != id);
        Ok(())
    }

    async fn upsert_event(&self, event: &Event) -> HomeboardResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.events.iter_mut().find(|e| {
            e.calendar_source_id == event.calendar_source_id
                && e.external_id.is_some()
                && e.external_id == event.external_id
        }) {
            let id = existing.id;
            *existing = event.clone();
            existing.id = id;
        } else {
            inner.events.push(event.clone());
        }
        Ok(())
    }

    async fn insert_event(&self, event: &Event) -> HomeboardResult<()> {
        self.inner.lock().unwrap().events.push(event.clone());
        Ok(())
    }

    async fn delete_event_by_external_id(
        &self,
        calendar_source_id: Uuid,
        external_id: &str,
    ) -> HomeboardResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.events.len();
        inner.events.retain(|e| {
            !(e.calendar_source_id == calendar_source_id
                && e.external_id.as_deref() == Some(external_id))
        });
        Ok(inner.events.len() < before)
    }

    async fn insert_webhook_channel(&self, channel: &WebhookChannel) -> HomeboardResult<()> {
        self.inner.lock().unwrap().channels.push(channel.clone());
        Ok(())
    }

    async fn delete_webhook_channel(&self, id: Uuid) -> HomeboardResult<()> {
        self.inner.lock().unwrap().channels.retain(|c| c.id != id);
        Ok(())
    }

    async fn webhook_channels_for_source(
        &self,
        calendar_source_id: Uuid,
    ) -> HomeboardResult<Vec<WebhookChannel>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .channels
            .iter()
            .filter(|c| c.calendar_source_id == calendar_source_id)
            .cloned()
            .collect())
    }

    async fn webhook_channel_by_channel_id(
        &self,
        channel_id: &str,
    ) -> HomeboardResult<Option<WebhookChannel>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|c| c.channel_id == channel_id)
            .cloned())
    }

    async fn all_webhook_channels(&self) -> HomeboardResult<Vec<WebhookChannel>> {
        Ok(self.inner.lock().unwrap().channels.clone())
    }

    async fn insert_chore(&self, chore: &Chore) -> HomeboardResult<()> {
        self.inner.lock().unwrap().chores.push(chore.clone());
        Ok(())
    }

    async fn chore(&self, id: Uuid) -> HomeboardResult<Option<Chore>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .chores
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn chore_assignment(&self, id: Uuid) -> HomeboardResult<Option<ChoreAssignment>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .assignments
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn insert_chore_assignment(&self, assignment: &ChoreAssignment) -> HomeboardResult<()> {
        self.inner.lock().unwrap().assignments.push(assignment.clone());
        Ok(())
    }

    async fn update_chore_assignment(&self, assignment: &ChoreAssignment) -> HomeboardResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.assignments.iter_mut().find(|a| a.id == assignment.id) {
            *existing = assignment.clone();
        }
        Ok(())
    }

    async fn household_for_user(&self, user_id: Uuid) -> HomeboardResult<Option<Uuid>> {
        Ok(self.inner.lock().unwrap().users.get(&user_id).copied())
    }
}
