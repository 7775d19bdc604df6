use super::{enum_column, is_unique_violation, time_column, uuid_column, Database, Insert};
use crate::auth::models::{User, UserRole};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        display_name: row.get(3)?,
        role: enum_column(row, 4, "role", UserRole::parse)?,
        created_at: time_column(row, 5)?,
    })
}

impl Database {
    /// Insert a user; `Conflict` when the email is already registered.
    pub async fn insert_user(&self, user: &User) -> Result<Insert<User>> {
        let conn = self.conn().await;
        let result = conn.execute(
            "INSERT INTO users (id, email, password_hash, display_name, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.display_name,
                user.role.as_str(),
                user.created_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(Insert::Created(user.clone())),
            Err(e) if is_unique_violation(&e) => Ok(Insert::Conflict),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))?;
        stmt.query_row(params![email.trim()], user_from_row)
            .optional()
            .context("Failed to look up user by email")
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let conn = self.conn().await;
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
        stmt.query_row(params![user_id.to_string()], user_from_row)
            .optional()
            .context("Failed to look up user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(email: &str, role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            display_name: "Test".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let db = Database::in_memory().unwrap();
        let user = test_user("guide@roadbook.test", UserRole::Guide);

        assert!(matches!(db.insert_user(&user).await.unwrap(), Insert::Created(_)));

        let by_email = db.find_user_by_email("guide@roadbook.test").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.role, UserRole::Guide);

        let by_id = db.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, user.email);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let db = Database::in_memory().unwrap();
        db.insert_user(&test_user("dup@roadbook.test", UserRole::Apprentice))
            .await
            .unwrap();

        let second = db
            .insert_user(&test_user("DUP@roadbook.test", UserRole::Apprentice))
            .await
            .unwrap();
        assert!(matches!(second, Insert::Conflict));
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let db = Database::in_memory().unwrap();
        assert!(db.find_user(Uuid::new_v4()).await.unwrap().is_none());
        assert!(db.find_user_by_email("nobody@roadbook.test").await.unwrap().is_none());
    }
}
