//! User, profile and session models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{now_timestamp, round2};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_coach: bool,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Body mass index, rounded to two decimals.
///
/// Needs both measurements and a non-zero height and weight.
pub fn compute_bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    match (weight_kg, height_cm) {
        (Some(weight), Some(height)) if weight > 0.0 && height > 0.0 => {
            let meters = height / 100.0;
            Some(round2(weight / (meters * meters)))
        }
        _ => None,
    }
}

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_coach: bool,
}

/// Editable "personal sheet" fields. Absent values clear the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl User {
    pub fn bmi(&self) -> Option<f64> {
        compute_bmi(self.weight_kg, self.height_cm)
    }

    pub async fn create(db: &SqlitePool, new: &NewUser) -> Result<User, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_coach, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.is_coach)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Exact, case-sensitive username lookup
    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(db)
            .await
    }

    pub async fn update_profile(
        db: &SqlitePool,
        id: &str,
        profile: &ProfileUpdate,
    ) -> Result<User, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users SET
                first_name = ?,
                last_name = ?,
                age = ?,
                height_cm = ?,
                weight_kg = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(profile.first_name.trim())
        .bind(profile.last_name.trim())
        .bind(profile.age)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(now_timestamp())
        .bind(id)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(db)
            .await
    }

    pub async fn count(db: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await
    }
}

/// Public view of another user (search results, friend lists)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_coach: bool,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_coach: user.is_coach,
        }
    }
}

/// The requesting user's own account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_coach: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_coach: user.is_coach,
        }
    }
}

/// Personal sheet with derived BMI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        let bmi = user.bmi();
        Self {
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            age: user.age,
            height_cm: user.height_cm,
            weight_kg: user.weight_kg,
            bmi,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

impl Session {
    pub async fn create(
        db: &SqlitePool,
        user_id: &str,
        token_hash: &str,
        expires_at: &str,
    ) -> Result<Session, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now_timestamp())
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM sessions WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    /// Unexpired session for a token hash
    pub async fn find_valid(
        db: &SqlitePool,
        token_hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?")
            .bind(token_hash)
            .bind(now_timestamp())
            .fetch_optional(db)
            .await
    }

    pub async fn delete_by_token_hash(db: &SqlitePool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub is_coach: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct SearchUsersRequest {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            is_coach: false,
        }
    }

    #[test]
    fn test_bmi() {
        assert_eq!(compute_bmi(Some(70.0), Some(175.0)), Some(22.86));
        assert_eq!(compute_bmi(Some(70.0), None), None);
        assert_eq!(compute_bmi(None, Some(175.0)), None);
        assert_eq!(compute_bmi(Some(70.0), Some(0.0)), None);
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = init_in_memory().await.unwrap();
        let user = User::create(&db, &new_user("marta")).await.unwrap();
        assert!(!user.is_coach);
        assert_eq!(user.first_name, "");
        assert!(user.age.is_none());

        let found = User::find_by_username(&db, "marta").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(User::find_by_username(&db, "Marta").await.unwrap().is_none());
        assert!(User::find_by_id(&db, "nope").await.unwrap().is_none());
        assert_eq!(User::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = init_in_memory().await.unwrap();
        User::create(&db, &new_user("marta")).await.unwrap();
        let err = User::create(&db, &new_user("marta")).await.unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[tokio::test]
    async fn test_update_profile_replaces_fields() {
        let db = init_in_memory().await.unwrap();
        let user = User::create(&db, &new_user("marta")).await.unwrap();

        let updated = User::update_profile(
            &db,
            &user.id,
            &ProfileUpdate {
                first_name: " Marta ".to_string(),
                last_name: "Rossi".to_string(),
                age: Some(31),
                height_cm: Some(175.0),
                weight_kg: Some(70.0),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.first_name, "Marta");
        assert_eq!(updated.bmi(), Some(22.86));

        let cleared = User::update_profile(&db, &user.id, &ProfileUpdate::default())
            .await
            .unwrap();
        assert!(cleared.weight_kg.is_none());
        assert!(cleared.bmi().is_none());
    }

    #[test]
    fn test_profile_response_carries_bmi() {
        let user = User {
            id: "u1".to_string(),
            username: "marta".to_string(),
            email: String::new(),
            password_hash: String::new(),
            is_coach: false,
            first_name: String::new(),
            last_name: String::new(),
            age: None,
            height_cm: Some(180.0),
            weight_kg: Some(81.0),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let profile = ProfileResponse::from(user);
        assert_eq!(profile.bmi, Some(25.0));
    }
}
