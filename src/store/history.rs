use super::Database;
use crate::models::{Competency, CompetencyStatus, DrivingSession, HistorySnapshot, RoadBook};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{named_params, params};
use uuid::Uuid;

const SNAPSHOT_SQL: &str = r#"
SELECT
    (SELECT COUNT(*) FROM driving_sessions WHERE apprentice_id = :user),
    (SELECT COUNT(*) FROM driving_sessions WHERE apprentice_id = :user AND ended_at IS NOT NULL),
    (SELECT COUNT(*) FROM driving_sessions WHERE apprentice_id = :user AND daylight = 'NIGHT'),
    (SELECT COUNT(*) FROM driving_sessions
        WHERE apprentice_id = :user AND (',' || road_types || ',') LIKE '%,HIGHWAY,%'),
    (SELECT COUNT(*) FROM driving_sessions WHERE validator_id = :user),
    (SELECT COUNT(*) FROM roadbooks WHERE owner_id = :user AND status = 'COMPLETED'),
    (SELECT COUNT(*) FROM competency_progress p
        JOIN competencies c ON c.id = p.competency_id
        WHERE p.user_id = :user AND p.status = 'MASTERED'
          AND c.category = 'MANEUVERING' AND lower(c.name) LIKE '%park%'),
    (SELECT COUNT(*) FROM competencies WHERE category = 'ECOFRIENDLY_DRIVING'),
    (SELECT COUNT(*) FROM competency_progress p
        JOIN competencies c ON c.id = p.competency_id
        WHERE p.user_id = :user AND p.status = 'MASTERED'
          AND c.category = 'ECOFRIENDLY_DRIVING')
"#;

impl Database {
    /// Everything badge criteria need, read in one statement.
    pub async fn load_history_snapshot(&self, user_id: Uuid) -> Result<HistorySnapshot> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(SNAPSHOT_SQL)?;
        stmt.query_row(named_params! { ":user": user_id.to_string() }, |row| {
            Ok(HistorySnapshot {
                sessions: row.get(0)?,
                completed_sessions: row.get(1)?,
                night_sessions: row.get(2)?,
                highway_sessions: row.get(3)?,
                validated_sessions: row.get(4)?,
                completed_roadbooks: row.get(5)?,
                mastered_parking: row.get(6)?,
                eco_competencies: row.get(7)?,
                eco_mastered: row.get(8)?,
            })
        })
        .context("Failed to load driving history")
    }

    pub async fn insert_session(&self, session: &DrivingSession) -> Result<()> {
        let road_types = session
            .road_types
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let conn = self.conn().await;
        conn.execute(
            "INSERT INTO driving_sessions
                (id, apprentice_id, roadbook_id, started_at, ended_at, daylight, road_types, validator_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.id.to_string(),
                session.apprentice_id.to_string(),
                session.roadbook_id.map(|id| id.to_string()),
                session.started_at.timestamp_millis(),
                session.ended_at.map(|t| t.timestamp_millis()),
                session.daylight.as_str(),
                road_types,
                session.validator_id.map(|id| id.to_string()),
            ],
        )
        .context("Failed to insert driving session")?;
        Ok(())
    }

    pub async fn insert_roadbook(&self, roadbook: &RoadBook) -> Result<()> {
        let conn = self.conn().await;
        conn.execute(
            "INSERT INTO roadbooks (id, owner_id, title, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                roadbook.id.to_string(),
                roadbook.owner_id.to_string(),
                roadbook.title,
                roadbook.status.as_str(),
                Utc::now().timestamp_millis(),
            ],
        )
        .context("Failed to insert roadbook")?;
        Ok(())
    }

    pub async fn insert_competency(&self, competency: &Competency) -> Result<()> {
        let conn = self.conn().await;
        conn.execute(
            "INSERT INTO competencies (id, name, category) VALUES (?1, ?2, ?3)",
            params![
                competency.id.to_string(),
                competency.name,
                competency.category.as_str(),
            ],
        )
        .context("Failed to insert competency")?;
        Ok(())
    }

    pub async fn set_competency_status(
        &self,
        user_id: Uuid,
        competency_id: Uuid,
        status: CompetencyStatus,
    ) -> Result<()> {
        let conn = self.conn().await;
        conn.execute(
            "INSERT INTO competency_progress (user_id, competency_id, status, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, competency_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at",
            params![
                user_id.to_string(),
                competency_id.to_string(),
                status.as_str(),
                Utc::now().timestamp_millis(),
            ],
        )
        .context("Failed to update competency progress")?;
        Ok(())
    }
}
