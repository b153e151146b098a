//! Workout log endpoints and the friends feed.
//!
//! Every lookup by id is scoped to the requesting user, so another user's
//! workout is reported exactly like a missing one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metrics::counter;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::metrics::WORKOUTS_LOGGED_TOTAL;
use super::validation::validate_workout;
use crate::db::{FeedEntry, Workout, WorkoutRequest};
use crate::AppState;

fn workout_not_found() -> ApiError {
    ApiError::not_found("Workout not found")
}

/// GET /api/feed
pub async fn feed(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FeedEntry>>, ApiError> {
    Ok(Json(Workout::feed_for(&state.db, &user.id).await?))
}

/// GET /api/workouts
pub async fn list_workouts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Workout>>, ApiError> {
    Ok(Json(Workout::list_for_user(&state.db, &user.id).await?))
}

/// POST /api/workouts
pub async fn create_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<WorkoutRequest>,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
    let input = validate_workout(&req)?;
    let workout = Workout::create(&state.db, &user.id, &input).await?;

    tracing::info!(
        user_id = %user.id,
        workout_id = %workout.id,
        workout_type = %input.workout_type,
        minutes = input.duration_minutes,
        "Workout logged"
    );
    counter!(WORKOUTS_LOGGED_TOTAL, "type" => input.workout_type.as_str()).increment(1);

    Ok((StatusCode::CREATED, Json(workout)))
}

/// GET /api/workouts/:id
pub async fn get_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Workout>, ApiError> {
    Workout::find_owned(&state.db, &id, &user.id)
        .await?
        .map(Json)
        .ok_or_else(workout_not_found)
}

/// PUT /api/workouts/:id
pub async fn update_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<WorkoutRequest>,
) -> Result<Json<Workout>, ApiError> {
    // Ownership before validation: a foreign id is a 404 whatever the body says
    if Workout::find_owned(&state.db, &id, &user.id).await?.is_none() {
        return Err(workout_not_found());
    }

    let input = validate_workout(&req)?;
    let workout = Workout::update_owned(&state.db, &id, &user.id, &input)
        .await?
        .ok_or_else(workout_not_found)?;

    tracing::info!(user_id = %user.id, workout_id = %id, "Workout updated");
    Ok(Json(workout))
}

/// DELETE /api/workouts/:id
pub async fn delete_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !Workout::delete_owned(&state.db, &id, &user.id).await? {
        return Err(workout_not_found());
    }

    tracing::info!(user_id = %user.id, workout_id = %id, "Workout deleted");
    Ok(StatusCode::NO_CONTENT)
}
