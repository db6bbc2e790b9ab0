//! Background sync dispatch.
//!
//! The webhook receiver must acknowledge promptly, so real sync work goes
//! through an explicit queue: `enqueue` hands the source id to a long-lived
//! worker task and returns immediately. The queue is in-process; a
//! multi-instance deployment would swap this for a durable message queue
//! without changing the call sites.

use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::orchestrator::SyncContext;

#[derive(Clone)]
pub struct SyncDispatcher {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl SyncDispatcher {
    /// Spawn the worker task and return the handle used to enqueue jobs.
    pub fn spawn(ctx: SyncContext) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Uuid>();

        tokio::spawn(async move {
            while let Some(source_id) = rx.recv().await {
                match ctx.store.calendar_source(source_id).await {
                    Ok(Some(source)) => {
                        // Outcome logging happens inside sync_source
                        ctx.sync_source(&source).await;
                    }
                    Ok(None) => {
                        warn!(source_id = %source_id, "queued sync for a source that no longer exists");
                    }
                    Err(e) => {
                        error!(source_id = %source_id, error = %e, "failed to load source for queued sync");
                    }
                }
            }
        });

        SyncDispatcher { tx }
    }

    /// Queue a sync for the source. Never blocks the caller.
    pub fn enqueue(&self, source_id: Uuid) {
        if self.tx.send(source_id).is_err() {
            error!(source_id = %source_id, "sync worker is gone, dropping job");
        }
    }
}
