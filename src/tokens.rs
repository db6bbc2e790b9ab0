//! Translation between a calendar source's encrypted token columns and the
//! provider's [`TokenBundle`].
//!
//! The `access_token` column holds a vault-encrypted JSON bundle (token plus
//! expiry) so the expiry survives at rest; the `refresh_token` column holds
//! the vault-encrypted refresh token alone.

use chrono::{DateTime, Utc};
use homeboard_core::{CalendarSource, HomeboardError, HomeboardResult, Vault};
use homeboard_provider_google::TokenBundle;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct StoredAccessToken {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Decrypt a source's token columns into a usable bundle.
pub fn decrypt_tokens(vault: &Vault, source: &CalendarSource) -> HomeboardResult<TokenBundle> {
    let stored: StoredAccessToken = serde_json::from_str(&vault.decrypt(&source.access_token)?)
        .map_err(|e| HomeboardError::Serialization(format!("Invalid stored token bundle: {e}")))?;

    let refresh_token = match &source.refresh_token {
        Some(sealed) => Some(vault.decrypt(sealed)?),
        None => None,
    };

    Ok(TokenBundle {
        access_token: stored.access_token,
        expires_at: stored.expires_at,
        refresh_token,
    })
}

/// Encrypt a bundle back into the `(access_token, refresh_token)` column
/// pair.
pub fn encrypt_tokens(
    vault: &Vault,
    tokens: &TokenBundle,
) -> HomeboardResult<(String, Option<String>)> {
    let stored = StoredAccessToken {
        access_token: tokens.access_token.clone(),
        expires_at: tokens.expires_at,
    };
    let bundle_json = serde_json::to_string(&stored)
        .map_err(|e| HomeboardError::Serialization(e.to_string()))?;

    let access_column = vault.encrypt(&bundle_json)?;
    let refresh_column = match &tokens.refresh_token {
        Some(token) => Some(vault.encrypt(token)?),
        None => None,
    };

    Ok((access_column, refresh_column))
}

/// Get a usable access token for a source, persisting any rotation that
/// happened along the way.
pub async fn source_access_token(
    store: &dyn crate::store::Store,
    api: &dyn crate::provider::CalendarApi,
    vault: &Vault,
    source: &CalendarSource,
) -> anyhow::Result<String> {
    let bundle = decrypt_tokens(vault, source)?;
    let access = api.ensure_valid(&bundle).await?;

    if let Some(rotated) = &access.rotated {
        let (access_column, refresh_column) = encrypt_tokens(vault, rotated)?;
        store
            .update_source_tokens(source.id, &access_column, refresh_column.as_deref())
            .await?;
    }

    Ok(access.access_token)
}
