//! Incremental sync of one calendar source against the remote provider.
//!
//! Fetches deltas with the stored sync token (or everything, when there is
//! none), reconciles them into local event storage, and persists the new
//! cursor. A rejected cursor falls back to a full listing; token revocation
//! is reported so the orchestrator can mark the source disconnected.

use chrono::Utc;
use homeboard_core::{CalendarSource, Event, HomeboardError, Vault};
use homeboard_provider_google::{GoogleApiError, GoogleEvent};
use tracing::{debug, info};
use uuid::Uuid;

use crate::provider::CalendarApi;
use crate::store::Store;
use crate::tokens::{decrypt_tokens, encrypt_tokens};

/// Result of a single sync call. Counts are reported even when a later step
/// failed, for observability.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub success: bool,
    pub events_upserted: u32,
    pub events_deleted: u32,
    pub new_sync_token: Option<String>,
    /// Terminal until the user re-authorizes; the caller decides whether to
    /// mark the source disconnected.
    pub needs_reconnect: bool,
    pub error: Option<String>,
}

#[derive(thiserror::Error, Debug)]
enum SyncError {
    #[error(transparent)]
    Provider(#[from] GoogleApiError),
    #[error(transparent)]
    Core(#[from] HomeboardError),
}

impl SyncError {
    fn needs_reconnect(&self) -> bool {
        matches!(self, SyncError::Provider(e) if e.needs_reconnect())
    }
}

/// Sync one calendar source. Never panics and never partially commits the
/// cursor: either reconciliation and the cursor update both apply, or the
/// failure is reported and the previous cursor stays valid for retry.
pub async fn sync_calendar_events(
    store: &dyn Store,
    api: &dyn CalendarApi,
    vault: &Vault,
    source: &CalendarSource,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    match run(store, api, vault, source, &mut outcome).await {
        Ok(()) => {
            outcome.success = true;
            debug!(
                source_id = %source.id,
                upserted = outcome.events_upserted,
                deleted = outcome.events_deleted,
                "calendar sync complete"
            );
        }
        Err(e) => {
            outcome.needs_reconnect = e.needs_reconnect();
            outcome.error = Some(e.to_string());
        }
    }

    outcome
}

async fn run(
    store: &dyn Store,
    api: &dyn CalendarApi,
    vault: &Vault,
    source: &CalendarSource,
    outcome: &mut SyncOutcome,
) -> Result<(), SyncError> {
    let tokens = decrypt_tokens(vault, source)?;
    let access = api.ensure_valid(&tokens).await?;

    // Persist rotated tokens before doing any work with them, so a failure
    // later in this sync doesn't lose the rotation
    if let Some(rotated) = &access.rotated {
        let (access_column, refresh_column) = encrypt_tokens(vault, rotated)?;
        store
            .update_source_tokens(source.id, &access_column, refresh_column.as_deref())
            .await?;
    }

    let changes = match api
        .list_changed_events(
            &access.access_token,
            &source.google_calendar_id,
            source.sync_token.as_deref(),
        )
        .await
    {
        // Stale cursor: the provider wants a full re-sync
        Err(GoogleApiError::SyncTokenInvalid) if source.sync_token.is_some() => {
            info!(source_id = %source.id, "sync token rejected, falling back to full fetch");
            api.list_changed_events(&access.access_token, &source.google_calendar_id, None)
                .await?
        }
        other => other?,
    };

    for remote in &changes.items {
        if remote.id.is_empty() {
            continue;
        }

        if remote.is_cancelled() {
            if store
                .delete_event_by_external_id(source.id, &remote.id)
                .await?
            {
                outcome.events_deleted += 1;
            }
        } else if let Some(event) = map_remote_event(source, remote) {
            store.upsert_event(&event).await?;
            outcome.events_upserted += 1;
        }
    }

    // The cursor and timestamp advance even on a zero-change pass, so
    // staleness-based scheduling keeps moving
    store
        .update_source_cursor(source.id, changes.next_sync_token.as_deref(), Utc::now())
        .await?;
    outcome.new_sync_token = changes.next_sync_token;

    Ok(())
}

/// Map a provider event to a local row. Items without a resolvable start or
/// end (some recurring masters come back degenerate) are skipped.
fn map_remote_event(source: &CalendarSource, remote: &GoogleEvent) -> Option<Event> {
    let start = remote.start.as_ref()?;
    let starts_at = start.to_utc()?;
    let ends_at = remote.end.as_ref()?.to_utc()?;

    let recurrence_rule = remote
        .recurrence
        .as_ref()
        .and_then(|lines| lines.iter().find(|l| l.starts_with("RRULE")))
        .cloned();

    Some(Event {
        id: Uuid::new_v4(),
        calendar_source_id: source.id,
        external_id: Some(remote.id.clone()),
        title: remote
            .summary
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "(No title)".to_string()),
        description: remote.description.clone(),
        location: remote.location.clone(),
        starts_at,
        ends_at,
        all_day: start.is_all_day(),
        recurrence_rule,
        raw: serde_json::to_value(remote).ok(),
    })
}
