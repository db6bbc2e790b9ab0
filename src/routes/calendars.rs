//! Calendar source endpoints: listing, enable/disable, disconnect, and
//! on-demand sync.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::routes::{ApiError, AuthUser, owned_source};
use crate::state::AppState;
use crate::webhooks;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/calendars", get(list_calendars))
        .route("/api/calendars/{id}", patch(update_calendar))
        .route("/api/calendars/{id}", delete(disconnect_calendar))
        .route("/api/calendars/{id}/sync", post(sync_calendar))
}

/// Calendar source as exposed to clients; token columns stay server-side.
#[derive(Serialize)]
pub struct CalendarSourceInfo {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub enabled: bool,
    pub google_calendar_id: String,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// GET /api/calendars - the household's connected calendars
async fn list_calendars(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CalendarSourceInfo>>, ApiError> {
    let household_id = state
        .store
        .household_for_user(user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let sources = state
        .store
        .calendar_sources_for_household(household_id)
        .await?;

    Ok(Json(
        sources
            .into_iter()
            .map(|s| CalendarSourceInfo {
                id: s.id,
                name: s.name,
                color: s.color,
                enabled: s.enabled,
                google_calendar_id: s.google_calendar_id,
                last_synced_at: s.last_synced_at,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct UpdateCalendarRequest {
    pub enabled: bool,
}

/// PATCH /api/calendars/:id - enable or disable a calendar.
///
/// Enabling registers a push channel and queues an initial sync; disabling
/// tears the channels down. Channel registration failures are logged, not
/// surfaced: polling sync still works without push.
async fn update_calendar(
    State(state): State<AppState>,
    user: AuthUser,
    Path(source_id): Path<Uuid>,
    Json(req): Json<UpdateCalendarRequest>,
) -> Result<Json<CalendarSourceInfo>, ApiError> {
    let source = owned_source(&state, user.user_id, source_id).await?;

    if req.enabled && source.refresh_token.is_none() {
        return Err(ApiError::Validation(
            "Calendar has no refresh token; reconnect it first".to_string(),
        ));
    }

    state.store.set_source_enabled(source.id, req.enabled).await?;

    if req.enabled {
        if let Err(e) = webhooks::register_channel(
            state.store.as_ref(),
            state.api.as_ref(),
            &state.vault,
            &source,
            &state.config.webhook_callback_url(),
        )
        .await
        {
            warn!(source_id = %source.id, error = %e, "webhook registration failed on enable");
        }
        state.dispatcher.enqueue(source.id);
    } else {
        webhooks::stop_all_channels(
            state.store.as_ref(),
            state.api.as_ref(),
            &state.vault,
            &source,
        )
        .await;
    }

    Ok(Json(CalendarSourceInfo {
        id: source.id,
        name: source.name,
        color: source.color,
        enabled: req.enabled,
        google_calendar_id: source.google_calendar_id,
        last_synced_at: source.last_synced_at,
    }))
}

/// DELETE /api/calendars/:id - disconnect a calendar.
///
/// Channel teardown is best effort; the row (and its events, via cascade)
/// is deleted regardless.
async fn disconnect_calendar(
    State(state): State<AppState>,
    user: AuthUser,
    Path(source_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let source = owned_source(&state, user.user_id, source_id).await?;

    webhooks::stop_all_channels(
        state.store.as_ref(),
        state.api.as_ref(),
        &state.vault,
        &source,
    )
    .await;

    state.store.delete_calendar_source(source.id).await?;
    state.rate_limiter.reset(source.id);

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub events_upserted: u32,
    pub events_deleted: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/calendars/:id/sync - on-demand sync of one calendar.
async fn sync_calendar(
    State(state): State<AppState>,
    user: AuthUser,
    Path(source_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    if !state.rate_limiter.allow(source_id) {
        return Err(ApiError::RateLimited);
    }

    let source = owned_source(&state, user.user_id, source_id).await?;

    // A concurrent sync for this source counts as "try again shortly"
    let outcome = state
        .sync
        .sync_source(&source)
        .await
        .ok_or(ApiError::RateLimited)?;

    let body = SyncResponse {
        success: outcome.success,
        events_upserted: outcome.events_upserted,
        events_deleted: outcome.events_deleted,
        error: outcome.error,
    };

    let status = if body.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(body)).into_response())
}
