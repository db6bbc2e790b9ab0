//! Push-notification channel lifecycle.
//!
//! Channels are registered when a calendar is connected, renewed before
//! their provider-assigned expiration lapses, and torn down when a calendar
//! is disabled or disconnected. Teardown is cleanup, not correctness: its
//! failures are logged and never block the surrounding flow.

use chrono::{DateTime, Duration, Utc};
use homeboard_core::{CalendarSource, Vault, WebhookChannel};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::provider::CalendarApi;
use crate::store::Store;
use crate::tokens::source_access_token;

/// Channels expiring within this horizon get replaced by the renewal cron.
const RENEWAL_HORIZON_HOURS: i64 = 24;

/// Fallback lifetime when the provider omits an expiration.
const DEFAULT_CHANNEL_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenewReport {
    pub renewed: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// Register a new push channel for the source's event feed and persist it.
pub async fn register_channel(
    store: &dyn Store,
    api: &dyn CalendarApi,
    vault: &Vault,
    source: &CalendarSource,
    callback_url: &str,
) -> anyhow::Result<WebhookChannel> {
    let access_token = source_access_token(store, api, vault, source).await?;

    let channel_id = Uuid::new_v4().to_string();
    let handle = api
        .watch_events(
            &access_token,
            &source.google_calendar_id,
            &channel_id,
            callback_url,
        )
        .await?;

    let channel = WebhookChannel {
        id: Uuid::new_v4(),
        calendar_source_id: source.id,
        channel_id,
        resource_id: handle.resource_id,
        expires_at: handle
            .expires_at
            .unwrap_or_else(|| Utc::now() + Duration::days(DEFAULT_CHANNEL_LIFETIME_DAYS)),
    };
    store.insert_webhook_channel(&channel).await?;

    info!(
        source_id = %source.id,
        channel_id = %channel.channel_id,
        expires_at = %channel.expires_at,
        "registered webhook channel"
    );

    Ok(channel)
}

/// Stop one channel with the provider (best effort) and delete its row.
/// The provider call is skipped when no access token could be obtained;
/// local deletion always proceeds.
pub async fn stop_channel(
    store: &dyn Store,
    api: &dyn CalendarApi,
    access_token: Option<&str>,
    channel: &WebhookChannel,
) {
    if let Some(access_token) = access_token {
        if let Err(e) = api
            .stop_channel(access_token, &channel.channel_id, &channel.resource_id)
            .await
        {
            warn!(channel_id = %channel.channel_id, error = %e, "failed to stop webhook channel");
        }
    }

    if let Err(e) = store.delete_webhook_channel(channel.id).await {
        warn!(channel_id = %channel.channel_id, error = %e, "failed to delete webhook channel row");
    }
}

/// Stop every channel for a source. Used during disconnection; deleting the
/// source record is not contingent on any of this succeeding.
pub async fn stop_all_channels(
    store: &dyn Store,
    api: &dyn CalendarApi,
    vault: &Vault,
    source: &CalendarSource,
) {
    let channels = match store.webhook_channels_for_source(source.id).await {
        Ok(channels) => channels,
        Err(e) => {
            warn!(source_id = %source.id, error = %e, "failed to list webhook channels for teardown");
            return;
        }
    };

    let access_token = match source_access_token(store, api, vault, source).await {
        Ok(token) => Some(token),
        Err(e) => {
            warn!(source_id = %source.id, error = %e, "no access token for channel teardown, deleting rows only");
            None
        }
    };

    for channel in &channels {
        stop_channel(store, api, access_token.as_deref(), channel).await;
    }
}

/// Renewal pass, run daily:
/// - channels of missing, disabled, or token-less sources are deleted
///   outright
/// - channels expiring within the horizon are replaced (stop, then
///   register; a failed registration leaves the source channel-less, to be
///   picked up on the next pass)
/// - enabled sources with no channel at all get one registered
pub async fn renew_expiring(
    store: &dyn Store,
    api: &dyn CalendarApi,
    vault: &Vault,
    callback_url: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<RenewReport> {
    let mut report = RenewReport::default();
    let horizon = now + Duration::hours(RENEWAL_HORIZON_HOURS);

    let channels = store.all_webhook_channels().await?;
    let mut covered_sources: HashSet<Uuid> = HashSet::new();

    for channel in &channels {
        covered_sources.insert(channel.calendar_source_id);

        let source = match store.calendar_source(channel.calendar_source_id).await? {
            Some(s) if s.can_auto_sync() => s,
            // Orphaned or no longer renewable: remove rather than renew
            other => {
                let access_token = match &other {
                    Some(s) => source_access_token(store, api, vault, s).await.ok(),
                    None => None,
                };
                stop_channel(store, api, access_token.as_deref(), channel).await;
                report.skipped += 1;
                continue;
            }
        };

        if channel.expires_at > horizon {
            report.skipped += 1;
            continue;
        }

        match renew_one(store, api, vault, &source, channel, callback_url).await {
            Ok(()) => report.renewed += 1,
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "webhook channel renewal failed");
                report.failed += 1;
            }
        }
    }

    // Enabled sources that ended up with no channel (first-time registration
    // or a renewal that failed on an earlier pass)
    for source in store.enabled_calendar_sources().await? {
        if covered_sources.contains(&source.id) || !source.can_auto_sync() {
            continue;
        }
        match register_channel(store, api, vault, &source, callback_url).await {
            Ok(_) => report.renewed += 1,
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "webhook channel registration failed");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

async fn renew_one(
    store: &dyn Store,
    api: &dyn CalendarApi,
    vault: &Vault,
    source: &CalendarSource,
    channel: &WebhookChannel,
    callback_url: &str,
) -> anyhow::Result<()> {
    let access_token = source_access_token(store, api, vault, source).await?;

    // Stop-then-register; stopping tolerates "already gone"
    stop_channel(store, api, Some(&access_token), channel).await;
    register_channel(store, api, vault, source, callback_url).await?;

    Ok(())
}
