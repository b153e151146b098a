pub mod auth;
pub mod error;
mod goals;
pub mod metrics;
pub mod rate_limit;
mod users;
mod validation;
mod workouts;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Credential endpoints (public, tight rate limit)
    let credential_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_auth,
        ));

    // Session endpoints resolve the user through the extractor
    let auth_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(credential_routes);

    // Protected API routes
    let api_routes = Router::new()
        // Personal sheet and friends
        .route(
            "/me/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/me/friends", get(users::list_friends))
        .route("/me/goals", get(goals::my_goals))
        // Search and the friend/coach actions
        .route("/users/search", post(users::search_users))
        .route("/users/:id/friend", post(users::toggle_friend))
        .route("/users/:id/coach", post(users::toggle_coach))
        // Workouts
        .route("/feed", get(workouts::feed))
        .route(
            "/workouts",
            get(workouts::list_workouts).post(workouts::create_workout),
        )
        .route(
            "/workouts/:id",
            get(workouts::get_workout)
                .put(workouts::update_workout)
                .delete(workouts::delete_workout),
        )
        // Coach goal management
        .route("/coach/athletes", get(goals::manage_goals))
        .route(
            "/coach/athletes/:id/goals",
            get(goals::get_goals).put(goals::set_goals),
        )
        // Protected by auth, rate limited before auth runs
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_endpoint))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(middleware::from_fn(metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
