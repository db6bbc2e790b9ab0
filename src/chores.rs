//! Chore completion and the recurrence side effect.
//!
//! Completing an assignment whose rule recurs creates exactly one successor
//! assignment at the next occurrence after the completion date, for the
//! same chore and assignee. The recurrence engine only computes dates;
//! assignment rows are created here.

use chrono::{DateTime, Utc};
use homeboard_core::recurrence::next_occurrence;
use homeboard_core::{ChoreAssignment, HomeboardResult};
use tracing::debug;
use uuid::Uuid;

use crate::store::Store;

pub struct CompletionResult {
    pub assignment: ChoreAssignment,
    pub successor: Option<ChoreAssignment>,
}

/// Mark an assignment completed and create its successor when it recurs.
///
/// Completing an already-completed assignment is a no-op (no second
/// successor); only the null → non-null transition of `completed_at`
/// produces one.
pub async fn complete_assignment(
    store: &dyn Store,
    assignment: &ChoreAssignment,
    completed_by: Uuid,
    completed_at: DateTime<Utc>,
) -> HomeboardResult<CompletionResult> {
    if assignment.is_completed() {
        return Ok(CompletionResult {
            assignment: assignment.clone(),
            successor: None,
        });
    }

    let mut completed = assignment.clone();
    completed.completed_at = Some(completed_at);
    completed.completed_by = Some(completed_by);
    store.update_chore_assignment(&completed).await?;

    let successor = completed
        .recurrence_rule
        .as_deref()
        .and_then(|rule| next_occurrence(Some(rule), completed_at.date_naive()))
        .map(|due_date| ChoreAssignment {
            id: Uuid::new_v4(),
            chore_id: completed.chore_id,
            assigned_to: completed.assigned_to,
            due_date,
            recurrence_rule: completed.recurrence_rule.clone(),
            completed_at: None,
            completed_by: None,
        });

    if let Some(successor) = &successor {
        store.insert_chore_assignment(successor).await?;
        debug!(
            chore_id = %successor.chore_id,
            due_date = %successor.due_date,
            "created successor assignment"
        );
    }

    Ok(CompletionResult {
        assignment: completed,
        successor,
    })
}
