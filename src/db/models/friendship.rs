//! Symmetric friendship relation.
//!
//! Stored as one row per direction. Every write goes through a transaction
//! touching both rows, so `a -> b` exists exactly when `b -> a` does.

use sqlx::SqlitePool;

use super::common::now_timestamp;
use super::user::User;

pub struct Friendship;

impl Friendship {
    pub async fn exists(db: &SqlitePool, user_id: &str, friend_id: &str) -> Result<bool, sqlx::Error> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM friendships WHERE user_id = ? AND friend_id = ?")
                .bind(user_id)
                .bind(friend_id)
                .fetch_optional(db)
                .await?;
        Ok(found.is_some())
    }

    /// Add the pair if `user_id` does not count `friend_id` as a friend,
    /// remove both directions otherwise. Returns whether they are friends
    /// afterwards.
    pub async fn toggle(db: &SqlitePool, user_id: &str, friend_id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = db.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM friendships WHERE user_id = ? AND friend_id = ?")
                .bind(user_id)
                .bind(friend_id)
                .fetch_optional(&mut *tx)
                .await?;

        let now_friends = if existing.is_some() {
            sqlx::query(
                r#"
                DELETE FROM friendships
                WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)
                "#,
            )
            .bind(user_id)
            .bind(friend_id)
            .bind(friend_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            false
        } else {
            let now = now_timestamp();
            for (from, to) in [(user_id, friend_id), (friend_id, user_id)] {
                sqlx::query(
                    "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at) VALUES (?, ?, ?)",
                )
                .bind(from)
                .bind(to)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
            true
        };

        tx.commit().await?;
        Ok(now_friends)
    }

    pub async fn list_friends(db: &SqlitePool, user_id: &str) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT u.* FROM users u
            JOIN friendships f ON f.friend_id = u.id
            WHERE f.user_id = ?
            ORDER BY u.username ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, NewUser};

    async fn user(db: &SqlitePool, name: &str) -> User {
        User::create(
            db,
            &NewUser {
                username: name.to_string(),
                email: String::new(),
                password_hash: "hash".to_string(),
                is_coach: false,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_toggle_is_symmetric() {
        let db = init_in_memory().await.unwrap();
        let a = user(&db, "anna").await;
        let b = user(&db, "bruno").await;

        assert!(Friendship::toggle(&db, &a.id, &b.id).await.unwrap());
        assert!(Friendship::exists(&db, &a.id, &b.id).await.unwrap());
        assert!(Friendship::exists(&db, &b.id, &a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let db = init_in_memory().await.unwrap();
        let a = user(&db, "anna").await;
        let b = user(&db, "bruno").await;

        Friendship::toggle(&db, &a.id, &b.id).await.unwrap();
        // Removal from the other side clears both directions
        assert!(!Friendship::toggle(&db, &b.id, &a.id).await.unwrap());
        assert!(!Friendship::exists(&db, &a.id, &b.id).await.unwrap());
        assert!(!Friendship::exists(&db, &b.id, &a.id).await.unwrap());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM friendships")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_list_friends() {
        let db = init_in_memory().await.unwrap();
        let a = user(&db, "anna").await;
        let c = user(&db, "carla").await;
        let b = user(&db, "bruno").await;

        Friendship::toggle(&db, &a.id, &c.id).await.unwrap();
        Friendship::toggle(&db, &b.id, &a.id).await.unwrap();

        let names: Vec<String> = Friendship::list_friends(&db, &a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["bruno", "carla"]);
        assert_eq!(Friendship::list_friends(&db, &c.id).await.unwrap().len(), 1);
    }
}
