//! Coach-assigned goals and athlete progress.
//!
//! Progress is never stored: it is derived from the athlete's logged
//! workouts and current weight each time it is read.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::now_timestamp;
use super::workout::{MinutesByType, WorkoutType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: String,
    pub coach_id: String,
    pub athlete_id: String,
    pub target_weight: Option<f64>,
    pub target_running_minutes: Option<i64>,
    pub target_swimming_minutes: Option<i64>,
    pub target_cycling_minutes: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// The four targets a coach can set. `None` means "no target"; zero is a
/// real target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalTargets {
    pub target_weight: Option<f64>,
    pub target_running_minutes: Option<i64>,
    pub target_swimming_minutes: Option<i64>,
    pub target_cycling_minutes: Option<i64>,
}

impl GoalTargets {
    pub fn minutes_for(&self, workout_type: WorkoutType) -> Option<i64> {
        match workout_type {
            WorkoutType::Run => self.target_running_minutes,
            WorkoutType::Swim => self.target_swimming_minutes,
            WorkoutType::Bike => self.target_cycling_minutes,
        }
    }
}

impl From<&Goal> for GoalTargets {
    fn from(goal: &Goal) -> Self {
        Self {
            target_weight: goal.target_weight,
            target_running_minutes: goal.target_running_minutes,
            target_swimming_minutes: goal.target_swimming_minutes,
            target_cycling_minutes: goal.target_cycling_minutes,
        }
    }
}

/// Goal joined with the coach's username
#[derive(Debug, Clone, FromRow)]
pub struct GoalWithCoach {
    pub id: String,
    pub coach_id: String,
    pub coach_username: String,
    pub target_weight: Option<f64>,
    pub target_running_minutes: Option<i64>,
    pub target_swimming_minutes: Option<i64>,
    pub target_cycling_minutes: Option<i64>,
}

impl GoalWithCoach {
    pub fn targets(&self) -> GoalTargets {
        GoalTargets {
            target_weight: self.target_weight,
            target_running_minutes: self.target_running_minutes,
            target_swimming_minutes: self.target_swimming_minutes,
            target_cycling_minutes: self.target_cycling_minutes,
        }
    }
}

/// Athlete listed on a coach's overview
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct AthleteSummary {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Complete,
    InProgress,
}

impl GoalStatus {
    /// Minutes goals are met once the total reaches the target
    pub fn for_minutes(current: i64, target: i64) -> Self {
        if current >= target {
            GoalStatus::Complete
        } else {
            GoalStatus::InProgress
        }
    }

    /// Weight goals are met at or below the target
    pub fn for_weight(current: f64, target: f64) -> Self {
        if current <= target {
            GoalStatus::Complete
        } else {
            GoalStatus::InProgress
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalStatus::Complete => write!(f, "complete"),
            GoalStatus::InProgress => write!(f, "in_progress"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityProgress {
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub label: String,
    pub current_minutes: i64,
    pub target_minutes: i64,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoachRef {
    pub id: String,
    pub username: String,
}

/// One coach's goal for the athlete, with live progress
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub goal_id: String,
    pub coach: CoachRef,
    pub activity_goals: Vec<ActivityProgress>,
    pub target_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub weight_status: Option<GoalStatus>,
}

impl GoalProgress {
    pub fn compute(goal: &GoalWithCoach, minutes: &MinutesByType, current_weight: Option<f64>) -> Self {
        let targets = goal.targets();

        // Zero is a target like any other; only a missing one is skipped
        let activity_goals = WorkoutType::ALL
            .iter()
            .filter_map(|&kind| {
                targets.minutes_for(kind).map(|target| {
                    let current = minutes.get(kind);
                    ActivityProgress {
                        workout_type: kind,
                        label: kind.label().to_string(),
                        current_minutes: current,
                        target_minutes: target,
                        status: GoalStatus::for_minutes(current, target),
                    }
                })
            })
            .collect();

        let weight_status = match (targets.target_weight, current_weight) {
            (Some(target), Some(current)) if current > 0.0 => {
                Some(GoalStatus::for_weight(current, target))
            }
            _ => None,
        };

        Self {
            goal_id: goal.id.clone(),
            coach: CoachRef {
                id: goal.coach_id.clone(),
                username: goal.coach_username.clone(),
            },
            activity_goals,
            target_weight: targets.target_weight,
            current_weight,
            weight_status,
        }
    }
}

impl Goal {
    pub async fn find(
        db: &SqlitePool,
        coach_id: &str,
        athlete_id: &str,
    ) -> Result<Option<Goal>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM goals WHERE coach_id = ? AND athlete_id = ?")
            .bind(coach_id)
            .bind(athlete_id)
            .fetch_optional(db)
            .await
    }

    /// Get-or-create the (coach, athlete) goal and replace all its targets.
    ///
    /// A single upsert against the unique (coach_id, athlete_id) index, so
    /// concurrent saves cannot produce a second row for the pair.
    pub async fn set_targets(
        db: &SqlitePool,
        coach_id: &str,
        athlete_id: &str,
        targets: &GoalTargets,
    ) -> Result<Goal, sqlx::Error> {
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO goals (
                id, coach_id, athlete_id, target_weight, target_running_minutes,
                target_swimming_minutes, target_cycling_minutes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(coach_id, athlete_id) DO UPDATE SET
                target_weight = excluded.target_weight,
                target_running_minutes = excluded.target_running_minutes,
                target_swimming_minutes = excluded.target_swimming_minutes,
                target_cycling_minutes = excluded.target_cycling_minutes,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(coach_id)
        .bind(athlete_id)
        .bind(targets.target_weight)
        .bind(targets.target_running_minutes)
        .bind(targets.target_swimming_minutes)
        .bind(targets.target_cycling_minutes)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM goals WHERE coach_id = ? AND athlete_id = ?")
            .bind(coach_id)
            .bind(athlete_id)
            .fetch_one(db)
            .await
    }

    /// Athletes this coach has assigned a goal to
    pub async fn athletes_for_coach(
        db: &SqlitePool,
        coach_id: &str,
    ) -> Result<Vec<AthleteSummary>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT DISTINCT u.id, u.username, u.first_name, u.last_name
            FROM goals g
            JOIN users u ON u.id = g.athlete_id
            WHERE g.coach_id = ?
            ORDER BY u.username ASC
            "#,
        )
        .bind(coach_id)
        .fetch_all(db)
        .await
    }

    /// Every goal assigned to an athlete, oldest first
    pub async fn list_for_athlete(
        db: &SqlitePool,
        athlete_id: &str,
    ) -> Result<Vec<GoalWithCoach>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT g.id, g.coach_id, c.username AS coach_username,
                   g.target_weight, g.target_running_minutes,
                   g.target_swimming_minutes, g.target_cycling_minutes
            FROM goals g
            JOIN users c ON c.id = g.coach_id
            WHERE g.athlete_id = ?
            ORDER BY g.created_at ASC, g.id ASC
            "#,
        )
        .bind(athlete_id)
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, NewUser, User};

    async fn user(db: &SqlitePool, name: &str, is_coach: bool) -> User {
        User::create(
            db,
            &NewUser {
                username: name.to_string(),
                email: String::new(),
                password_hash: "hash".to_string(),
                is_coach,
            },
        )
        .await
        .unwrap()
    }

    fn goal_with(targets: GoalTargets) -> GoalWithCoach {
        GoalWithCoach {
            id: "g1".to_string(),
            coach_id: "c1".to_string(),
            coach_username: "coach".to_string(),
            target_weight: targets.target_weight,
            target_running_minutes: targets.target_running_minutes,
            target_swimming_minutes: targets.target_swimming_minutes,
            target_cycling_minutes: targets.target_cycling_minutes,
        }
    }

    #[test]
    fn test_minutes_status_uses_greater_or_equal() {
        assert_eq!(GoalStatus::for_minutes(0, 0), GoalStatus::Complete);
        assert_eq!(GoalStatus::for_minutes(120, 120), GoalStatus::Complete);
        assert_eq!(GoalStatus::for_minutes(119, 120), GoalStatus::InProgress);
    }

    #[test]
    fn test_weight_status() {
        assert_eq!(GoalStatus::for_weight(70.0, 72.0), GoalStatus::Complete);
        assert_eq!(GoalStatus::for_weight(72.0, 72.0), GoalStatus::Complete);
        assert_eq!(GoalStatus::for_weight(75.5, 72.0), GoalStatus::InProgress);
    }

    #[test]
    fn test_progress_skips_missing_targets_but_keeps_zero() {
        let goal = goal_with(GoalTargets {
            target_weight: None,
            target_running_minutes: Some(0),
            target_swimming_minutes: None,
            target_cycling_minutes: Some(90),
        });
        let minutes = MinutesByType {
            run: 0,
            swim: 40,
            bike: 60,
        };

        let progress = GoalProgress::compute(&goal, &minutes, Some(80.0));
        assert_eq!(progress.activity_goals.len(), 2);
        assert_eq!(progress.activity_goals[0].workout_type, WorkoutType::Run);
        assert_eq!(progress.activity_goals[0].status, GoalStatus::Complete);
        assert_eq!(progress.activity_goals[1].workout_type, WorkoutType::Bike);
        assert_eq!(progress.activity_goals[1].current_minutes, 60);
        assert_eq!(progress.activity_goals[1].status, GoalStatus::InProgress);
        assert!(progress.weight_status.is_none());
        assert_eq!(progress.coach.username, "coach");
    }

    #[test]
    fn test_progress_weight_needs_current_weight() {
        let goal = goal_with(GoalTargets {
            target_weight: Some(72.0),
            ..Default::default()
        });
        let minutes = MinutesByType::default();

        let done = GoalProgress::compute(&goal, &minutes, Some(71.0));
        assert_eq!(done.weight_status, Some(GoalStatus::Complete));
        assert!(done.activity_goals.is_empty());

        let pending = GoalProgress::compute(&goal, &minutes, Some(80.0));
        assert_eq!(pending.weight_status, Some(GoalStatus::InProgress));

        let unknown = GoalProgress::compute(&goal, &minutes, None);
        assert!(unknown.weight_status.is_none());
        assert_eq!(unknown.target_weight, Some(72.0));
    }

    #[tokio::test]
    async fn test_set_targets_is_get_or_create() {
        let db = init_in_memory().await.unwrap();
        let coach = user(&db, "coach", true).await;
        let athlete = user(&db, "athlete", false).await;

        let first = Goal::set_targets(
            &db,
            &coach.id,
            &athlete.id,
            &GoalTargets {
                target_running_minutes: Some(120),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let second = Goal::set_targets(
            &db,
            &coach.id,
            &athlete.id,
            &GoalTargets {
                target_weight: Some(70.0),
                target_swimming_minutes: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.target_running_minutes, None);
        assert_eq!(second.target_swimming_minutes, Some(0));
        assert_eq!(second.target_weight, Some(70.0));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goals")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_athletes_and_goals_listing() {
        let db = init_in_memory().await.unwrap();
        let coach = user(&db, "coach", true).await;
        let other_coach = user(&db, "zeta", true).await;
        let bea = user(&db, "bea", false).await;
        let al = user(&db, "al", false).await;

        Goal::set_targets(&db, &coach.id, &bea.id, &GoalTargets::default()).await.unwrap();
        Goal::set_targets(&db, &coach.id, &al.id, &GoalTargets::default()).await.unwrap();
        Goal::set_targets(&db, &other_coach.id, &bea.id, &GoalTargets::default()).await.unwrap();

        let athletes = Goal::athletes_for_coach(&db, &coach.id).await.unwrap();
        let names: Vec<&str> = athletes.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["al", "bea"]);

        let goals = Goal::list_for_athlete(&db, &bea.id).await.unwrap();
        assert_eq!(goals.len(), 2);
        assert!(goals.iter().any(|g| g.coach_username == "zeta"));

        assert!(Goal::find(&db, &other_coach.id, &al.id).await.unwrap().is_none());
    }
}
