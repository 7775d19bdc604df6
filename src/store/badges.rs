use super::notifications::write_notification;
use super::{is_unique_violation, time_column, uuid_column, Database, Insert};
use crate::badges::criteria::CriteriaTag;
use crate::badges::models::{Badge, EarnedBadge, UserBadge};
use crate::notifications::models::Notification;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashSet;
use uuid::Uuid;

const BADGE_COLUMNS: &str = "id, name, description, image_url, category, criteria, created_at";

fn badge_from_row(row: &Row<'_>) -> rusqlite::Result<Badge> {
    let criteria: String = row.get(5)?;
    Ok(Badge {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        image_url: row.get(3)?,
        category: row.get(4)?,
        criteria: CriteriaTag::parse(&criteria),
        created_at: time_column(row, 6)?,
    })
}

impl Database {
    pub async fn insert_badge(&self, badge: &Badge) -> Result<Insert<Badge>> {
        let conn = self.conn().await;
        let result = conn.execute(
            "INSERT INTO badges (id, name, description, image_url, category, criteria, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                badge.id.to_string(),
                badge.name,
                badge.description,
                badge.image_url,
                badge.category,
                badge.criteria.as_str(),
                badge.created_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(Insert::Created(badge.clone())),
            Err(e) if is_unique_violation(&e) => Ok(Insert::Conflict),
            Err(e) => Err(e).context("Failed to insert badge"),
        }
    }

    pub async fn list_badges(&self) -> Result<Vec<Badge>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges ORDER BY category ASC, name ASC"
        ))?;
        let badges = stmt
            .query_map([], badge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(badges)
    }

    pub async fn find_badge(&self, badge_id: Uuid) -> Result<Option<Badge>> {
        let conn = self.conn().await;
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {BADGE_COLUMNS} FROM badges WHERE id = ?1"))?;
        stmt.query_row(params![badge_id.to_string()], badge_from_row)
            .optional()
            .context("Failed to look up badge")
    }

    pub async fn count_badges(&self) -> Result<i64> {
        let conn = self.conn().await;
        let count = conn.query_row("SELECT COUNT(*) FROM badges", [], |row| row.get(0))?;
        Ok(count)
    }

    pub async fn held_badge_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let conn = self.conn().await;
        let mut stmt =
            conn.prepare_cached("SELECT badge_id FROM user_badges WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id.to_string()], |row| uuid_column(row, 0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    /// Record an award together with the notification announcing it.
    ///
    /// The UNIQUE(user_id, badge_id) constraint is the only duplicate check;
    /// a second award of the same pair yields `Conflict` and writes nothing.
    /// The award and the notification commit together or not at all.
    pub async fn insert_user_badge(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
        awarded_at: DateTime<Utc>,
        notice: &Notification,
    ) -> Result<Insert<UserBadge>> {
        let award = UserBadge {
            id: Uuid::new_v4(),
            user_id,
            badge_id,
            awarded_at,
        };

        let mut conn = self.conn().await;
        let tx = conn.transaction()?;
        let result = tx.execute(
            "INSERT INTO user_badges (id, user_id, badge_id, awarded_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                award.id.to_string(),
                user_id.to_string(),
                badge_id.to_string(),
                awarded_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(Insert::Conflict),
            Err(e) => return Err(e).context("Failed to insert user badge"),
        }

        write_notification(&tx, notice).context("Failed to insert badge notification")?;
        tx.commit().context("Failed to commit badge award")?;
        Ok(Insert::Created(award))
    }

    pub async fn delete_user_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<usize> {
        let conn = self.conn().await;
        let deleted = conn.execute(
            "DELETE FROM user_badges WHERE user_id = ?1 AND badge_id = ?2",
            params![user_id.to_string(), badge_id.to_string()],
        )?;
        Ok(deleted)
    }

    /// Badges held by a user, most recent award first.
    pub async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<EarnedBadge>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(
            "SELECT b.id, b.name, b.description, b.image_url, b.category, b.criteria, b.created_at,
                    ub.awarded_at
             FROM user_badges ub
             JOIN badges b ON b.id = ub.badge_id
             WHERE ub.user_id = ?1
             ORDER BY ub.awarded_at DESC, ub.rowid DESC",
        )?;
        let earned = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(EarnedBadge {
                    badge: badge_from_row(row)?,
                    awarded_at: time_column(row, 7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(earned)
    }
}
