//! OAuth initiation and callback for connecting Google calendars.
//!
//! Initiation redirects to the consent screen with a CSRF state of the form
//! `<user id>:<random hex>`, mirrored into a short-lived cookie. The
//! callback validates state, exchanges the code, persists encrypted tokens,
//! and creates one disabled calendar source per remote calendar. Every
//! failure branch redirects back to the selection page with an error tag.

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
};
use rand::RngCore;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::routes::{ApiError, AuthUser};
use crate::state::AppState;
use crate::tokens::encrypt_tokens;
use homeboard_core::CalendarSource;
use homeboard_provider_google::GoogleApiError;

const STATE_COOKIE: &str = "gcal_oauth_state";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/google", get(start_oauth))
        .route("/api/auth/google/callback", get(oauth_callback))
}

/// GET /api/auth/google - redirect to the provider consent screen.
async fn start_oauth(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    let csrf_state = format!("{}:{}", user.user_id, hex::encode(nonce));

    let consent_url = state.api.auth_url(&csrf_state);

    let cookie = format!(
        "{STATE_COOKIE}={csrf_state}; Path=/; Max-Age=600; HttpOnly; SameSite=Lax"
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::temporary(&consent_url),
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /api/auth/google/callback - complete the OAuth dance.
async fn oauth_callback(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let redirect = |tag: Option<&str>| callback_redirect(&state, tag);

    if let Some(error) = &query.error {
        info!(error, "user denied calendar access");
        return redirect(Some("access_denied"));
    }

    // CSRF: the state must match the cookie we set and belong to this user
    let expected_prefix = format!("{}:", user.user_id);
    let cookie_state = state_cookie(&headers);
    let valid_state = match (&query.state, &cookie_state) {
        (Some(returned), Some(stored)) => {
            returned == stored && returned.starts_with(&expected_prefix)
        }
        _ => false,
    };
    if !valid_state {
        warn!(user_id = %user.user_id, "OAuth state mismatch");
        return redirect(Some("invalid_state"));
    }

    let Some(code) = &query.code else {
        return redirect(Some("invalid_state"));
    };

    let household_id = match state.store.household_for_user(user.user_id).await {
        Ok(Some(household_id)) => household_id,
        Ok(None) => return redirect(Some("no_household")),
        Err(e) => {
            warn!(error = %e, "failed to resolve household during OAuth callback");
            return redirect(Some("store_error"));
        }
    };

    let tokens = match state.api.exchange_code(code).await {
        Ok(tokens) => tokens,
        Err(GoogleApiError::MissingRefreshToken) => return redirect(Some("no_refresh_token")),
        Err(e) => {
            warn!(error = %e, "code exchange failed");
            return redirect(Some("google_error"));
        }
    };

    let calendars = match state.api.list_calendars(&tokens.access_token).await {
        Ok(calendars) => calendars,
        Err(e) => {
            warn!(error = %e, "failed to list calendars after OAuth");
            return redirect(Some("google_error"));
        }
    };

    let (access_column, refresh_column) = match encrypt_tokens(&state.vault, &tokens) {
        Ok(columns) => columns,
        Err(e) => {
            warn!(error = %e, "failed to encrypt tokens");
            return redirect(Some("store_error"));
        }
    };

    // One row per remote calendar, initially disabled; the user picks which
    // ones to enable on the selection page
    for calendar in calendars {
        let source = CalendarSource {
            id: Uuid::new_v4(),
            household_id,
            provider: "google".to_string(),
            google_calendar_id: calendar.id,
            name: if calendar.summary.is_empty() {
                "(unnamed)".to_string()
            } else {
                calendar.summary
            },
            color: calendar.background_color,
            enabled: false,
            access_token: access_column.clone(),
            refresh_token: refresh_column.clone(),
            sync_token: None,
            last_synced_at: None,
        };

        if let Err(e) = state.store.upsert_calendar_source(&source).await {
            warn!(error = %e, "failed to persist calendar source");
            return redirect(Some("store_error"));
        }
    }

    redirect(None)
}

fn callback_redirect(state: &AppState, error_tag: Option<&str>) -> Response {
    let url = match error_tag {
        Some(tag) => format!(
            "{}/calendars/select?error={tag}",
            state.config.public_base_url
        ),
        None => format!(
            "{}/calendars/select?connected=1",
            state.config.public_base_url
        ),
    };

    // Expire the state cookie either way; it is single-use
    let clear_cookie = format!("{STATE_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");

    (
        AppendHeaders([(header::SET_COOKIE, clear_cookie)]),
        Redirect::temporary(&url),
    )
        .into_response()
}

fn state_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == STATE_COOKIE).then(|| value.to_string())
    })
}
