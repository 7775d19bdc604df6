//! SQLite persistence
//! Mission: Single shared store for users, credentials, badges, history and notifications

pub mod badges;
pub mod history;
pub mod notifications;
pub mod refresh_tokens;
pub mod users;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Connection, Row};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    display_name TEXT NOT NULL,
    role TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- Refresh credentials are never deleted; state moves ACTIVE -> REVOKED only.
CREATE TABLE IF NOT EXISTS refresh_tokens (
    id TEXT PRIMARY KEY,
    token_digest TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL REFERENCES users(id),
    state TEXT NOT NULL CHECK (state IN ('ACTIVE', 'REVOKED')),
    expires_at INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    revoked_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_state
    ON refresh_tokens(user_id, state);

CREATE TABLE IF NOT EXISTS badges (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    image_url TEXT,
    category TEXT NOT NULL,
    criteria TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_badges (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    badge_id TEXT NOT NULL REFERENCES badges(id),
    awarded_at INTEGER NOT NULL,
    UNIQUE (user_id, badge_id)
);

CREATE TABLE IF NOT EXISTS roadbooks (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS driving_sessions (
    id TEXT PRIMARY KEY,
    apprentice_id TEXT NOT NULL REFERENCES users(id),
    roadbook_id TEXT REFERENCES roadbooks(id),
    started_at INTEGER NOT NULL,
    ended_at INTEGER,
    daylight TEXT NOT NULL,
    road_types TEXT NOT NULL DEFAULT '',
    validator_id TEXT REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_driving_sessions_apprentice
    ON driving_sessions(apprentice_id);
CREATE INDEX IF NOT EXISTS idx_driving_sessions_validator
    ON driving_sessions(validator_id);

CREATE TABLE IF NOT EXISTS competencies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS competency_progress (
    user_id TEXT NOT NULL REFERENCES users(id),
    competency_id TEXT NOT NULL REFERENCES competencies(id),
    status TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, competency_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    link TEXT,
    is_read INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_user_created
    ON notifications(user_id, created_at DESC);
"#;

/// Result of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert<T> {
    Created(T),
    Conflict,
}

/// Shared handle to the RoadBook database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to apply schema")?;

        info!("📒 RoadBook database ready at {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn().await;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .context("Database unreachable")
    }

    pub(crate) async fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind} value '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    Ok(from_millis(millis))
}

pub(crate) fn opt_time_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let millis: Option<i64> = row.get(idx)?;
    Ok(millis.map(from_millis))
}

pub(crate) fn enum_column<T>(
    row: &Row<'_>,
    idx: usize,
    kind: &'static str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(UnknownValue { kind, value: raw }),
        )
    })
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_str().unwrap();

        Database::open(path).unwrap();
        // Re-opening must not fail on existing tables
        let db = Database::open(path).unwrap();

        let conn = db.conn().await;
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 9);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().await;

        let result = conn.execute(
            "INSERT INTO notifications (id, user_id, kind, title, message, created_at)
             VALUES ('n1', 'missing-user', 'SYSTEM', 't', 'm', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_millis_roundtrip_keeps_precision() {
        let now = Utc::now();
        let back = from_millis(now.timestamp_millis());
        assert_eq!(back.timestamp_millis(), now.timestamp_millis());
    }
}
