//! Recurring household tasks and their concrete due-date occurrences.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A household task definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chore {
    pub id: Uuid,
    pub household_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// A concrete due-date occurrence of a chore.
///
/// Completing an assignment that carries a recurrence rule produces exactly
/// one successor assignment (same chore, same assignee) dated at the next
/// occurrence after the completion date. Assignments are never mutated by
/// the recurrence engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreAssignment {
    pub id: Uuid,
    pub chore_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub due_date: NaiveDate,
    pub recurrence_rule: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
}

impl ChoreAssignment {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
