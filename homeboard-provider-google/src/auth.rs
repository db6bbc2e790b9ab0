//! OAuth token management: status checks, refresh, consent URL, code
//! exchange.
//!
//! Rotated tokens are returned to the caller as an explicit payload rather
//! than applied through a callback, so persisting them is a visible step at
//! the call site.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::GoogleClient;
use crate::error::{GoogleApiError, GoogleApiResult};

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Access tokens expiring within this buffer are treated as already expired,
/// so a token can't lapse mid-sync.
const EXPIRY_BUFFER_MINUTES: i64 = 5;

/// OAuth application credentials.
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// A decrypted token bundle as persisted on a calendar source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Expiry and refreshability of a token bundle. "Not expired" with
/// "cannot refresh" is a legitimate state (live access token, no refresh
/// token stored), not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStatus {
    pub is_expired: bool,
    pub can_refresh: bool,
}

impl TokenStatus {
    pub fn of(tokens: &TokenBundle, now: DateTime<Utc>) -> Self {
        let is_expired = match tokens.expires_at {
            // No recorded expiry: assume the worst and refresh
            None => true,
            Some(expires_at) => expires_at <= now + Duration::minutes(EXPIRY_BUFFER_MINUTES),
        };

        TokenStatus {
            is_expired,
            can_refresh: tokens.refresh_token.is_some(),
        }
    }
}

/// A usable access token plus, when a refresh happened, the rotated bundle
/// the caller must persist.
#[derive(Debug, Clone)]
pub struct ValidAccess {
    pub access_token: String,
    pub rotated: Option<TokenBundle>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .filter(|s| *s > 0)
            .map(|s| Utc::now() + Duration::seconds(s))
    }
}

impl GoogleClient {
    /// Build the consent URL: offline access for a refresh token, forced
    /// consent so previously-authorized users still get one, and the
    /// caller's CSRF state embedded.
    pub fn auth_url(&self, state: &str, scopes: &[&str]) -> String {
        let mut url = Url::parse(AUTH_ENDPOINT).expect("static endpoint URL is valid");
        url.query_pairs_mut()
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("redirect_uri", &self.credentials.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", state);
        url.to_string()
    }

    /// One-shot trade of an authorization code for an initial token bundle.
    pub async fn exchange_code(&self, code: &str) -> GoogleApiResult<TokenBundle> {
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let tokens = Self::read_token_response(response).await?;

        if tokens.refresh_token.is_none() {
            return Err(GoogleApiError::MissingRefreshToken);
        }

        Ok(TokenBundle {
            expires_at: tokens.expires_at(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Exchange a refresh token for a fresh access token. An `invalid_grant`
    /// rejection means the grant itself was revoked, which is terminal until
    /// the user reconnects.
    pub async fn refresh(&self, tokens: &TokenBundle) -> GoogleApiResult<TokenBundle> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or(GoogleApiError::ReauthRequired)?;

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let refreshed = Self::read_token_response(response).await?;

        Ok(TokenBundle {
            expires_at: refreshed.expires_at(),
            access_token: refreshed.access_token,
            // Google typically doesn't return a new refresh_token on refresh
            refresh_token: refreshed
                .refresh_token
                .or_else(|| tokens.refresh_token.clone()),
        })
    }

    /// Return a usable access token for the bundle, refreshing when the
    /// current one is expired (or about to be). The rotated bundle, when
    /// present, must be persisted by the caller before using the token.
    pub async fn ensure_valid(&self, tokens: &TokenBundle) -> GoogleApiResult<ValidAccess> {
        let status = TokenStatus::of(tokens, Utc::now());

        if !status.is_expired {
            return Ok(ValidAccess {
                access_token: tokens.access_token.clone(),
                rotated: None,
            });
        }

        if !status.can_refresh {
            return Err(GoogleApiError::ReauthRequired);
        }

        let rotated = self.refresh(tokens).await?;
        Ok(ValidAccess {
            access_token: rotated.access_token.clone(),
            rotated: Some(rotated),
        })
    }

    async fn read_token_response(response: reqwest::Response) -> GoogleApiResult<TokenResponse> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let error_code = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str().map(String::from)));

        if error_code.as_deref() == Some("invalid_grant") {
            return Err(GoogleApiError::TokenRevoked);
        }

        Err(GoogleApiError::Api {
            status: status.as_u16(),
            message: error_code.unwrap_or(body),
        })
    }
}
