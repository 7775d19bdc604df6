use super::{enum_column, time_column, uuid_column, Database};
use crate::notifications::models::{Notification, NotificationType};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, link, is_read, created_at";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        kind: enum_column(row, 2, "notification type", NotificationType::parse)?,
        title: row.get(3)?,
        message: row.get(4)?,
        link: row.get(5)?,
        is_read: row.get(6)?,
        created_at: time_column(row, 7)?,
    })
}

/// Shared by standalone inserts and by transactions that emit a notification.
pub(super) fn write_notification(conn: &Connection, n: &Notification) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, kind, title, message, link, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            n.id.to_string(),
            n.user_id.to_string(),
            n.kind.as_str(),
            n.title,
            n.message,
            n.link,
            n.is_read,
            n.created_at.timestamp_millis(),
        ],
    )
}

impl Database {
    pub async fn insert_notification(&self, n: &Notification) -> Result<()> {
        let conn = self.conn().await;
        write_notification(&conn, n).context("Failed to insert notification")?;
        Ok(())
    }

    /// Newest first.
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3"
        ))?;
        let rows = stmt
            .query_map(
                params![user_id.to_string(), unread_only, limit],
                notification_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Unread notifications created at or after `since`, newest first.
    pub async fn unread_notifications_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = ?1 AND is_read = 0 AND created_at >= ?2
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
            .query_map(
                params![user_id.to_string(), since.timestamp_millis()],
                notification_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64> {
        let conn = self.conn().await;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Returns false when the notification does not exist or belongs to someone else.
    pub async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let conn = self.conn().await;
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    pub async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<usize> {
        let conn = self.conn().await;
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            params![user_id.to_string()],
        )?;
        Ok(changed)
    }

    pub async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let conn = self.conn().await;
        let deleted = conn.execute(
            "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    pub async fn delete_all_notifications(&self, user_id: Uuid) -> Result<usize> {
        let conn = self.conn().await;
        let deleted = conn.execute(
            "DELETE FROM notifications WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;
        Ok(deleted)
    }

    /// Purge read notifications created before `cutoff`, across all users.
    pub async fn delete_read_notifications_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn().await;
        let deleted = conn.execute(
            "DELETE FROM notifications WHERE is_read = 1 AND created_at < ?1",
            params![cutoff.timestamp_millis()],
        )?;
        Ok(deleted)
    }

    /// Rewrite the kept notification and drop the rest of its group atomically.
    pub async fn collapse_notifications(
        &self,
        keep_id: Uuid,
        title: &str,
        message: &str,
        remove: &[Uuid],
    ) -> Result<usize> {
        let mut conn = self.conn().await;
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE notifications SET title = ?2, message = ?3 WHERE id = ?1",
            params![keep_id.to_string(), title, message],
        )?;

        let mut removed = 0;
        if !remove.is_empty() {
            let placeholders = vec!["?"; remove.len()].join(", ");
            removed = tx.execute(
                &format!("DELETE FROM notifications WHERE id IN ({placeholders})"),
                params_from_iter(remove.iter().map(|id| id.to_string())),
            )?;
        }

        tx.commit().context("Failed to collapse notifications")?;
        Ok(removed)
    }
}
