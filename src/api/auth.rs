//! Accounts and sessions: signup (with auto-login), login, logout, and the
//! middleware/extractor that resolve the requesting user.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lazy_static::lazy_static;
use metrics::counter;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::metrics::{LOGINS_TOTAL, SIGNUPS_TOTAL};
use super::validation::{password_problems, validate_email, validate_username};
use crate::db::{
    format_timestamp, LoginRequest, LoginResponse, NewUser, Session, SignupRequest, User,
    UserResponse,
};
use crate::AppState;

/// Session token cookie name
pub const SESSION_COOKIE: &str = "fittrack_session";

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

lazy_static! {
    /// Verified against when the username is unknown, so both login
    /// failures cost one argon2 verification.
    static ref DUMMY_PASSWORD_HASH: Option<String> =
        hash_password("fittrack-no-such-user").ok();
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Bearer header first, then the session cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Open a session for `user`, returning the raw token
async fn start_session(state: &AppState, user: &User) -> Result<String, ApiError> {
    let token = generate_token();
    let expires_at = format_timestamp(
        chrono::Utc::now() + chrono::Duration::hours(state.config.auth.session_ttl_hours),
    );
    Session::create(&state.db, &user.id, &hash_token(&token), &expires_at).await?;
    Ok(token)
}

/// Resolve a raw token to its user, if the session is still valid
pub async fn user_for_token(db: &sqlx::SqlitePool, token: &str) -> Result<Option<User>, ApiError> {
    let session = match Session::find_valid(db, &hash_token(token)).await? {
        Some(s) => s,
        None => return Ok(None),
    };
    Ok(User::find_by_id(db, &session.user_id).await?)
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<LoginResponse>), ApiError> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    let mut errors = ValidationErrorBuilder::new();
    errors.check("username", validate_username(&username));
    errors.check("email", validate_email(&email));
    for problem in password_problems(
        &request.password,
        &request.password_confirm,
        &username,
        state.config.auth.min_password_length,
    ) {
        errors.add("password", problem);
    }
    errors.finish()?;

    if User::find_by_username(&state.db, &username).await?.is_some() {
        return Err(ApiError::conflict("A user with that username already exists."));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    let user = User::create(
        &state.db,
        &NewUser {
            username,
            email,
            password_hash,
            is_coach: request.is_coach,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, is_coach = user.is_coach, "User signed up");
    counter!(SIGNUPS_TOTAL).increment(1);

    // Auto-login the new user
    let token = start_session(&state, &user).await?;
    let jar = jar.add(session_cookie(token.clone(), state.config.auth.secure_cookies));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(LoginResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let user = match User::find_by_username(&state.db, request.username.trim()).await? {
        Some(user) => user,
        None => {
            if let Some(hash) = DUMMY_PASSWORD_HASH.as_deref() {
                verify_password(&request.password, hash);
            }
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    if !verify_password(&request.password, &user.password_hash) {
        tracing::info!(username = %user.username, "Rejected login with wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = start_session(&state, &user).await?;
    let jar = jar.add(session_cookie(token.clone(), state.config.auth.secure_cookies));
    counter!(LOGINS_TOTAL).increment(1);
    tracing::debug!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        Json(LoginResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    if let Some(token) = extract_token(&headers) {
        Session::delete_by_token_hash(&state.db, &hash_token(&token)).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out.".to_string(),
        }),
    ))
}

/// GET /api/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Auth middleware: resolves the session and stashes the user for handlers
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user = user_for_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// The logged-in user making the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        user_for_token(&state.db, &token)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))
    }
}
