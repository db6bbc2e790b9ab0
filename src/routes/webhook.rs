//! Receiver for Google push notifications.
//!
//! Always acknowledges with 200 unless the identifying headers are missing
//! outright: returning errors to the provider only buys retry storms. Real
//! sync work is queued and runs after the acknowledgement is sent.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::routes::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhooks/google", post(receive_google))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /api/webhooks/google - change notification for a watched calendar.
async fn receive_google(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let channel_id = header(&headers, "x-goog-channel-id");
    let resource_state = header(&headers, "x-goog-resource-state");

    let (Some(channel_id), Some(resource_state)) = (channel_id, resource_state) else {
        return Err(ApiError::Validation(
            "Missing X-Goog-Channel-ID or X-Goog-Resource-State header".to_string(),
        ));
    };
    if header(&headers, "x-goog-resource-id").is_none() {
        return Err(ApiError::Validation(
            "Missing X-Goog-Resource-ID header".to_string(),
        ));
    }

    // "sync" is the provider verifying reachability at registration time
    if resource_state == "sync" {
        debug!(channel_id, "webhook channel verification ping");
        return Ok(Json(json!({ "received": true })));
    }

    let channel = match state.store.webhook_channel_by_channel_id(channel_id).await {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            // Stale notification for a channel we already dropped
            warn!(channel_id, "notification for unknown webhook channel");
            return Ok(Json(json!({ "received": true })));
        }
        Err(e) => {
            warn!(channel_id, error = %e, "failed to look up webhook channel");
            return Ok(Json(json!({ "received": true })));
        }
    };

    match state.store.calendar_source(channel.calendar_source_id).await {
        Ok(Some(source)) if source.can_auto_sync() => {
            state.dispatcher.enqueue(source.id);
        }
        Ok(_) => {
            warn!(channel_id, "notification for a disabled or token-less source");
        }
        Err(e) => {
            warn!(channel_id, error = %e, "failed to load source for webhook");
        }
    }

    Ok(Json(json!({ "received": true })))
}
