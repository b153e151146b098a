//! Workout log entries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{now_timestamp, today};

/// Kind of workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Run,
    Swim,
    Bike,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown workout type: {0} (expected run, swim or bike)")]
pub struct UnknownWorkoutType(pub String);

impl WorkoutType {
    pub const ALL: [WorkoutType; 3] = [WorkoutType::Run, WorkoutType::Swim, WorkoutType::Bike];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Run => "run",
            WorkoutType::Swim => "swim",
            WorkoutType::Bike => "bike",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            WorkoutType::Run => "Running",
            WorkoutType::Swim => "Swimming",
            WorkoutType::Bike => "Cycling",
        }
    }
}

impl std::fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkoutType {
    type Err = UnknownWorkoutType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run" => Ok(WorkoutType::Run),
            "swim" => Ok(WorkoutType::Swim),
            "bike" => Ok(WorkoutType::Bike),
            _ => Err(UnknownWorkoutType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub duration_minutes: i64,
    pub date: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Workout {
    /// Get the type as a WorkoutType enum
    pub fn type_enum(&self) -> Option<WorkoutType> {
        self.workout_type.parse().ok()
    }
}

/// A friend's workout as shown in the feed
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedEntry {
    pub id: String,
    pub user_id: String,
    pub username: String,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub duration_minutes: i64,
    pub date: String,
    pub notes: String,
}

/// Validated workout fields, shared by create and edit
#[derive(Debug, Clone)]
pub struct WorkoutInput {
    pub workout_type: WorkoutType,
    pub duration_minutes: i64,
    pub notes: String,
}

/// Raw create/edit body; `type` is checked by the validation layer
#[derive(Debug, Deserialize)]
pub struct WorkoutRequest {
    #[serde(rename = "type")]
    pub workout_type: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub notes: String,
}

/// Total minutes per workout type for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MinutesByType {
    pub run: i64,
    pub swim: i64,
    pub bike: i64,
}

impl MinutesByType {
    pub fn get(&self, workout_type: WorkoutType) -> i64 {
        match workout_type {
            WorkoutType::Run => self.run,
            WorkoutType::Swim => self.swim,
            WorkoutType::Bike => self.bike,
        }
    }
}

impl Workout {
    /// Insert a workout dated today
    pub async fn create(
        db: &SqlitePool,
        user_id: &str,
        input: &WorkoutInput,
    ) -> Result<Workout, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO workouts (id, user_id, workout_type, duration_minutes, date, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(input.workout_type.as_str())
        .bind(input.duration_minutes)
        .bind(today())
        .bind(&input.notes)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM workouts WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    /// Fetch a workout only if `user_id` owns it
    pub async fn find_owned(
        db: &SqlitePool,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Workout>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM workouts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    /// Update type, duration and notes. The date is kept.
    pub async fn update_owned(
        db: &SqlitePool,
        id: &str,
        user_id: &str,
        input: &WorkoutInput,
    ) -> Result<Option<Workout>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE workouts SET
                workout_type = ?,
                duration_minutes = ?,
                notes = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(input.workout_type.as_str())
        .bind(input.duration_minutes)
        .bind(&input.notes)
        .bind(now_timestamp())
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_owned(db, id, user_id).await
    }

    pub async fn delete_owned(db: &SqlitePool, id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// A user's own workouts, newest first
    pub async fn list_for_user(db: &SqlitePool, user_id: &str) -> Result<Vec<Workout>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM workouts WHERE user_id = ? ORDER BY date DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Workouts of everyone `user_id` is friends with, newest first
    pub async fn feed_for(db: &SqlitePool, user_id: &str) -> Result<Vec<FeedEntry>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT w.id, w.user_id, u.username, w.workout_type, w.duration_minutes, w.date, w.notes
            FROM workouts w
            JOIN friendships f ON f.friend_id = w.user_id
            JOIN users u ON u.id = w.user_id
            WHERE f.user_id = ?
            ORDER BY w.date DESC, w.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Sum of logged minutes per type; types with no workouts count as 0
    pub async fn minutes_by_type(db: &SqlitePool, user_id: &str) -> Result<MinutesByType, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT workout_type, CAST(COALESCE(SUM(duration_minutes), 0) AS INTEGER)
            FROM workouts
            WHERE user_id = ?
            GROUP BY workout_type
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        let mut totals = MinutesByType::default();
        for (kind, minutes) in rows {
            match kind.parse::<WorkoutType>() {
                Ok(WorkoutType::Run) => totals.run += minutes,
                Ok(WorkoutType::Swim) => totals.swim += minutes,
                Ok(WorkoutType::Bike) => totals.bike += minutes,
                Err(e) => tracing::warn!(error = %e, "Skipping workouts with unknown type"),
            }
        }
        Ok(totals)
    }

    pub async fn count(db: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
            .fetch_one(db)
            .await
    }
}
