//! Google Calendar provider for Homeboard.
//!
//! Talks to the Calendar v3 REST API directly with reqwest: OAuth token
//! exchange and refresh, incremental event listing via sync tokens, event
//! insertion, and push-notification channel lifecycle.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::{GoogleCredentials, TokenBundle, TokenStatus, ValidAccess};
pub use client::GoogleClient;
pub use error::{GoogleApiError, GoogleApiResult};
pub use types::{
    CalendarListEntry, ChangeSet, ChannelHandle, EventPayload, GoogleEvent, GoogleEventTime,
};

/// Scope required for calendar list, event read/write, and push channels.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];
