//! Error taxonomy for the Google provider.
//!
//! Revocation, stale sync tokens, and missing refresh tokens each get their
//! own kind so callers can route them (disable the source, fall back to a
//! full fetch, send the user back through consent) instead of retrying.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoogleApiError {
    #[error("Google API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Sync token is no longer valid; a full re-sync is required")]
    SyncTokenInvalid,

    #[error("Refresh token has been revoked; the calendar must be reconnected")]
    TokenRevoked,

    #[error("Access token expired and no refresh token is available")]
    ReauthRequired,

    #[error("Google returned no refresh token; re-consent is required")]
    MissingRefreshToken,

    #[error("Unexpected response from Google: {0}")]
    Malformed(String),
}

impl GoogleApiError {
    /// True for the conditions that are terminal until the user
    /// re-authorizes, as opposed to transient provider failures.
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            GoogleApiError::TokenRevoked | GoogleApiError::ReauthRequired
        )
    }
}

pub type GoogleApiResult<T> = Result<T, GoogleApiError>;
