//! Core types for the Homeboard ecosystem.
//!
//! This crate provides the pieces shared between the server and the
//! calendar provider:
//! - domain models (`CalendarSource`, `Event`, `WebhookChannel`, chores)
//! - the credential vault for OAuth tokens at rest
//! - the recurrence engine for chore schedules

pub mod chore;
pub mod error;
pub mod event;
pub mod recurrence;
pub mod source;
pub mod vault;
pub mod webhook;

pub use chore::{Chore, ChoreAssignment};
pub use error::{HomeboardError, HomeboardResult};
pub use event::Event;
pub use source::CalendarSource;
pub use vault::Vault;
pub use webhook::WebhookChannel;
