//! Personal sheet, user search, and the friend/coach actions.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::validation::validate_profile;
use crate::db::{Friendship, ProfileResponse, ProfileUpdate, SearchUsersRequest, User, UserSummary};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub result: Option<UserSummary>,
    pub is_friend: bool,
    pub is_coach: bool,
    pub show_actions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FriendToggleResponse {
    pub user: UserSummary,
    pub is_friend: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CoachInfoResponse {
    pub user: UserSummary,
    pub is_coach: bool,
    pub message: String,
}

async fn load_user(state: &AppState, id: &str) -> Result<User, ApiError> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// GET /api/me/profile
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(user))
}

/// PUT /api/me/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    validate_profile(&req)?;

    let updated = User::update_profile(&state.db, &user.id, &req).await?;
    tracing::info!(user_id = %user.id, "Personal sheet updated");

    Ok(Json(ProfileResponse::from(updated)))
}

/// POST /api/users/search
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SearchUsersRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::validation_field("username", "Username is required"));
    }

    if username == user.username {
        return Ok(Json(SearchResponse {
            result: None,
            is_friend: false,
            is_coach: false,
            show_actions: false,
            message: Some("You cannot search for yourself.".to_string()),
        }));
    }

    let found = User::find_by_username(&state.db, username)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User '{}' does not exist.", username)))?;

    let is_friend = Friendship::exists(&state.db, &user.id, &found.id).await?;
    let is_coach = found.is_coach;

    Ok(Json(SearchResponse {
        result: Some(UserSummary::from(found)),
        is_friend,
        is_coach,
        show_actions: true,
        message: None,
    }))
}

/// POST /api/users/:id/friend
pub async fn toggle_friend(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FriendToggleResponse>, ApiError> {
    let target = load_user(&state, &id).await?;
    if target.id == user.id {
        return Err(ApiError::bad_request("You cannot add yourself as a friend."));
    }

    let is_friend = Friendship::toggle(&state.db, &user.id, &target.id).await?;
    let message = if is_friend {
        format!("You added {} to your friends.", target.username)
    } else {
        format!("You removed {} from your friends.", target.username)
    };
    tracing::info!(user_id = %user.id, friend_id = %target.id, is_friend, "Friendship toggled");

    Ok(Json(FriendToggleResponse {
        user: UserSummary::from(target),
        is_friend,
        message,
    }))
}

/// POST /api/users/:id/coach
///
/// Informational only: there is no athlete-to-coach relation to change.
pub async fn toggle_coach(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CoachInfoResponse>, ApiError> {
    let target = load_user(&state, &id).await?;

    if !target.is_coach {
        return Err(ApiError::bad_request(format!(
            "{} is not a coach and cannot be added as one.",
            target.username
        )));
    }

    let message = format!("{} is a coach and you can follow them.", target.username);
    Ok(Json(CoachInfoResponse {
        user: UserSummary::from(target),
        is_coach: true,
        message,
    }))
}

/// GET /api/me/friends
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let friends = Friendship::list_friends(&state.db, &user.id).await?;
    Ok(Json(friends.into_iter().map(UserSummary::from).collect()))
}
