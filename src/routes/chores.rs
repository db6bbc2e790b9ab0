//! Chore assignment completion endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chores::complete_assignment;
use crate::routes::{ApiError, AuthUser};
use crate::state::AppState;
use homeboard_core::recurrence::{RecurrenceConfig, describe_rrule, generate_rrule};
use homeboard_core::{Chore, ChoreAssignment};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chores", post(create_chore))
        .route(
            "/api/chores/assignments/{id}/complete",
            post(complete_chore_assignment),
        )
}

#[derive(Deserialize)]
pub struct CreateChoreRequest {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

#[derive(Serialize)]
pub struct ChoreResponse {
    pub chore: Chore,
    pub assignment: ChoreAssignment,
    /// Human-readable schedule, e.g. "every week on Monday"
    pub schedule: String,
}

/// POST /api/chores - create a chore and its first assignment. The
/// structured recurrence intent is encoded to a rule anchored at the first
/// due date.
async fn create_chore(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateChoreRequest>,
) -> Result<Json<ChoreResponse>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Chore title is required".to_string()));
    }

    let household_id = state
        .store
        .household_for_user(user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let chore = Chore {
        id: Uuid::new_v4(),
        household_id,
        title: req.title,
        description: req.description,
    };
    state.store.insert_chore(&chore).await?;

    let recurrence_rule = generate_rrule(&req.recurrence, req.due_date);
    let assignment = ChoreAssignment {
        id: Uuid::new_v4(),
        chore_id: chore.id,
        assigned_to: req.assigned_to,
        due_date: req.due_date,
        recurrence_rule,
        completed_at: None,
        completed_by: None,
    };
    state.store.insert_chore_assignment(&assignment).await?;

    let schedule = describe_rrule(assignment.recurrence_rule.as_deref());

    Ok(Json(ChoreResponse {
        chore,
        assignment,
        schedule,
    }))
}

#[derive(Serialize)]
pub struct CompletionResponse {
    pub assignment: ChoreAssignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successor: Option<ChoreAssignment>,
}

/// POST /api/chores/assignments/:id/complete
async fn complete_chore_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let household_id = state
        .store
        .household_for_user(user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let assignment = state
        .store
        .chore_assignment(assignment_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    // Ownership runs through the chore's household
    let chore = state
        .store
        .chore(assignment.chore_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if chore.household_id != household_id {
        return Err(ApiError::NotFound);
    }

    let result =
        complete_assignment(state.store.as_ref(), &assignment, user.user_id, Utc::now()).await?;

    Ok(Json(CompletionResponse {
        assignment: result.assignment,
        successor: result.successor,
    }))
}
