//! Coach goal management and the athlete's progress view.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::validation::validate_goal_targets;
use crate::db::{AthleteSummary, Goal, GoalProgress, GoalTargets, User, UserSummary, Workout};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AthleteGoalResponse {
    pub athlete: UserSummary,
    pub targets: GoalTargets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MyGoalsResponse {
    pub goals: Vec<GoalProgress>,
    pub current_weight: Option<f64>,
}

fn require_coach(user: &User) -> Result<(), ApiError> {
    if user.is_coach {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, "Non-coach refused on coach route");
        Err(ApiError::forbidden("Access reserved for coaches."))
    }
}

async fn load_athlete(state: &AppState, id: &str) -> Result<User, ApiError> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Athlete not found"))
}

/// GET /api/coach/athletes
pub async fn manage_goals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AthleteSummary>>, ApiError> {
    require_coach(&user)?;
    Ok(Json(Goal::athletes_for_coach(&state.db, &user.id).await?))
}

/// GET /api/coach/athletes/:id/goals
pub async fn get_goals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(athlete_id): Path<String>,
) -> Result<Json<AthleteGoalResponse>, ApiError> {
    require_coach(&user)?;
    let athlete = load_athlete(&state, &athlete_id).await?;

    let targets = Goal::find(&state.db, &user.id, &athlete.id)
        .await?
        .map(|g| GoalTargets::from(&g))
        .unwrap_or_default();

    Ok(Json(AthleteGoalResponse {
        athlete: UserSummary::from(athlete),
        targets,
        message: None,
    }))
}

/// PUT /api/coach/athletes/:id/goals
///
/// Replaces all four targets. Missing fields become null and explicit
/// zeros are stored as zeros.
pub async fn set_goals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(athlete_id): Path<String>,
    Json(targets): Json<GoalTargets>,
) -> Result<Json<AthleteGoalResponse>, ApiError> {
    require_coach(&user)?;
    let athlete = load_athlete(&state, &athlete_id).await?;
    validate_goal_targets(&targets)?;

    let goal = Goal::set_targets(&state.db, &user.id, &athlete.id, &targets).await?;
    tracing::info!(coach_id = %user.id, athlete_id = %athlete.id, goal_id = %goal.id, "Goals updated");

    let message = format!("Goals updated for {}.", athlete.username);
    Ok(Json(AthleteGoalResponse {
        athlete: UserSummary::from(athlete),
        targets: GoalTargets::from(&goal),
        message: Some(message),
    }))
}

/// GET /api/me/goals
pub async fn my_goals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MyGoalsResponse>, ApiError> {
    let goals = Goal::list_for_athlete(&state.db, &user.id).await?;
    let minutes = Workout::minutes_by_type(&state.db, &user.id).await?;

    let goals = goals
        .iter()
        .map(|goal| GoalProgress::compute(goal, &minutes, user.weight_kg))
        .collect();

    Ok(Json(MyGoalsResponse {
        goals,
        current_weight: user.weight_kg,
    }))
}
