//! Decides which calendar sources get synced, and runs the engine with
//! per-source isolation.
//!
//! Single-flight guard: a cron-triggered and a webhook-triggered sync for
//! the same source cannot race on the cursor; the second caller is told the
//! source is already in flight and skips.

use chrono::{DateTime, Duration, Utc};
use homeboard_core::{CalendarSource, Vault};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::provider::CalendarApi;
use crate::store::Store;
use crate::sync::{SyncOutcome, sync_calendar_events};

/// Sources last synced longer ago than this are due for the cron pass.
const STALENESS_MINUTES: i64 = 5;

/// Aggregate result of a scheduled sync pass.
#[derive(Debug, Default, Serialize)]
pub struct CronSyncReport {
    pub calendars_synced: u32,
    pub total_events_upserted: u32,
    pub total_events_deleted: u32,
    pub failures: u32,
}

/// In-process set of source ids with a sync in flight.
#[derive(Clone, Default)]
pub struct SyncGuard {
    inflight: Arc<Mutex<HashSet<Uuid>>>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the source; `None` when a sync for it is already running.
    pub fn try_begin(&self, source_id: Uuid) -> Option<SyncPermit> {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        if !inflight.insert(source_id) {
            return None;
        }
        Some(SyncPermit {
            source_id,
            inflight: Arc::clone(&self.inflight),
        })
    }
}

/// Releases the claim on drop, so every exit path (including panics inside
/// the task) frees the source.
pub struct SyncPermit {
    source_id: Uuid,
    inflight: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.source_id);
    }
}

/// Everything a sync invocation needs; cheap to clone into tasks.
#[derive(Clone)]
pub struct SyncContext {
    pub store: Arc<dyn Store>,
    pub api: Arc<dyn CalendarApi>,
    pub vault: Arc<Vault>,
    pub guard: SyncGuard,
}

impl SyncContext {
    /// Run one guarded sync. `None` means another sync for this source is
    /// already in flight. Token revocation marks the source disconnected
    /// here, so every entry point gets that behavior.
    pub async fn sync_source(&self, source: &CalendarSource) -> Option<SyncOutcome> {
        let _permit = match self.guard.try_begin(source.id) {
            Some(permit) => permit,
            None => {
                debug!(source_id = %source.id, "sync already in flight, skipping");
                return None;
            }
        };

        let outcome =
            sync_calendar_events(self.store.as_ref(), self.api.as_ref(), &self.vault, source).await;

        if outcome.needs_reconnect {
            warn!(source_id = %source.id, "token revoked, disabling calendar source");
            if let Err(e) = self.store.set_source_enabled(source.id, false).await {
                error!(source_id = %source.id, error = %e, "failed to disable revoked source");
            }
        } else if let Some(error) = &outcome.error {
            warn!(source_id = %source.id, error = %error, "calendar sync failed");
        }

        Some(outcome)
    }

    /// Scheduled pass: sync every enabled source that is stale, all
    /// concurrently, isolating failures per source.
    pub async fn sync_stale_sources(&self, now: DateTime<Utc>) -> anyhow::Result<CronSyncReport> {
        let sources = self.store.enabled_calendar_sources().await?;

        let mut handles = Vec::new();
        for source in sources.into_iter().filter(|s| is_stale(s, now)) {
            let ctx = self.clone();
            handles.push(tokio::spawn(async move {
                ctx.sync_source(&source).await
            }));
        }

        let mut report = CronSyncReport::default();
        for handle in handles {
            match handle.await {
                Ok(Some(outcome)) => {
                    report.total_events_upserted += outcome.events_upserted;
                    report.total_events_deleted += outcome.events_deleted;
                    if outcome.success {
                        report.calendars_synced += 1;
                    } else {
                        report.failures += 1;
                    }
                }
                // Claimed by a concurrent caller; not our failure
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "sync task panicked");
                    report.failures += 1;
                }
            }
        }

        Ok(report)
    }
}

fn is_stale(source: &CalendarSource, now: DateTime<Utc>) -> bool {
    match source.last_synced_at {
        None => true,
        Some(last) => last < now - Duration::minutes(STALENESS_MINUTES),
    }
}
