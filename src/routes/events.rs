//! Display-originated event creation: write to the provider first, then
//! mirror the acknowledged event locally.

use axum::{
    Json, Router,
    extract::State,
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::{ApiError, AuthUser, owned_source};
use crate::state::AppState;
use crate::tokens::source_access_token;
use homeboard_core::Event;
use homeboard_provider_google::{EventPayload, GoogleEventTime};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/events", post(create_event))
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub calendar_source_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
}

/// POST /api/events - create an event on the remote calendar and mirror it.
async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Event title is required".to_string()));
    }
    if req.ends_at <= req.starts_at {
        return Err(ApiError::Validation(
            "Event must end after it starts".to_string(),
        ));
    }

    let source = owned_source(&state, user.user_id, req.calendar_source_id).await?;

    let access_token = source_access_token(
        state.store.as_ref(),
        state.api.as_ref(),
        &state.vault,
        &source,
    )
    .await?;

    let (start, end) = if req.all_day {
        (
            GoogleEventTime::all_day(req.starts_at.date_naive()),
            GoogleEventTime::all_day(req.ends_at.date_naive()),
        )
    } else {
        (
            GoogleEventTime::timed(req.starts_at),
            GoogleEventTime::timed(req.ends_at),
        )
    };

    let payload = EventPayload {
        summary: req.title.clone(),
        description: req.description.clone(),
        location: req.location.clone(),
        start,
        end,
    };

    let remote = state
        .api
        .insert_event(&access_token, &source.google_calendar_id, &payload)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    // Mirror locally with the provider-assigned id so the next sync
    // recognizes it instead of duplicating it
    let event = Event {
        id: Uuid::new_v4(),
        calendar_source_id: source.id,
        external_id: Some(remote.id.clone()),
        title: req.title,
        description: req.description,
        location: req.location,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        all_day: req.all_day,
        recurrence_rule: None,
        raw: serde_json::to_value(&remote).ok(),
    };
    state.store.insert_event(&event).await?;

    Ok(Json(event))
}
