//! Route handlers and the HTTP error type.

pub mod auth;
pub mod calendars;
pub mod chores;
pub mod cron;
pub mod events;
pub mod webhook;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use homeboard_core::HomeboardError;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

/// Standard API error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP-mapped error taxonomy: validation 400, auth 401, ownership 404,
/// rate limiting 429, everything else 500 (logged, generic body).
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Unauthorized,
    NotFound,
    RateLimited,
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many sync requests, try again shortly".to_string(),
            ),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<HomeboardError> for ApiError {
    fn from(err: HomeboardError) -> Self {
        match err {
            HomeboardError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Internal(other.into()),
        }
    }
}

/// Resolve a calendar source the user's household owns. Missing source,
/// user without a household, and household mismatch all look identical to
/// the caller (404), so ids can't be probed across households.
pub(crate) async fn owned_source(
    state: &crate::state::AppState,
    user_id: Uuid,
    source_id: Uuid,
) -> Result<homeboard_core::CalendarSource, ApiError> {
    let household_id = state
        .store
        .household_for_user(user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let source = state
        .store
        .calendar_source(source_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if source.household_id != household_id {
        return Err(ApiError::NotFound);
    }

    Ok(source)
}

/// Authenticated user context.
///
/// Session handling lives in the fronting auth layer, which injects the
/// verified user id as the `x-user-id` header; requests without it are
/// unauthenticated.
pub struct AuthUser {
    pub user_id: Uuid,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser { user_id })
    }
}
