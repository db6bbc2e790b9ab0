//! Scheduled entry points, invoked by an external cron service with a
//! shared bearer secret.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use chrono::Utc;

use crate::orchestrator::CronSyncReport;
use crate::routes::ApiError;
use crate::state::AppState;
use crate::webhooks::{self, RenewReport};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cron/sync", post(run_sync))
        .route("/api/cron/webhooks", post(run_webhook_renewal))
}

fn require_cron_auth(headers: &HeaderMap, state: &AppState) -> Result<(), ApiError> {
    let expected = format!("Bearer {}", state.config.cron_secret);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if !authorized {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

/// POST /api/cron/sync - sync every enabled calendar source that has gone
/// stale, concurrently.
async fn run_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronSyncReport>, ApiError> {
    require_cron_auth(&headers, &state)?;

    let report = state.sync.sync_stale_sources(Utc::now()).await?;
    Ok(Json(report))
}

/// POST /api/cron/webhooks - renew push channels nearing expiration.
async fn run_webhook_renewal(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RenewReport>, ApiError> {
    require_cron_auth(&headers, &state)?;

    let report = webhooks::renew_expiring(
        state.store.as_ref(),
        state.api.as_ref(),
        &state.vault,
        &state.config.webhook_callback_url(),
        Utc::now(),
    )
    .await?;

    Ok(Json(report))
}
