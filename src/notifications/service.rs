//! Notification service
//! Mission: Per-user inbox operations plus aggregation of bursts of same-type entries

use crate::error::{FieldError, ServiceError};
use crate::notifications::models::{AggregationReport, Notification, NotificationType};
use crate::store::Database;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 100;
pub const DEFAULT_CLEANUP_DAYS: i64 = 30;

/// Only unread entries newer than this are considered for aggregation
const AGGREGATION_WINDOW_HOURS: i64 = 12;
/// Groups larger than this collapse into one entry
const AGGREGATION_THRESHOLD: usize = 3;

#[derive(Clone)]
pub struct NotificationService {
    db: Database,
}

impl NotificationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Result<Notification, ServiceError> {
        let notification = Notification::new(user_id, kind, title, message, link);
        self.db.insert_notification(&notification).await?;
        debug!(
            user_id = %user_id,
            kind = kind.as_str(),
            "Notification created"
        );
        Ok(notification)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Notification>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        Ok(self.db.list_notifications(user_id, unread_only, limit).await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        Ok(self.db.count_unread_notifications(user_id).await?)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !self.db.mark_notification_read(user_id, id).await? {
            return Err(ServiceError::NotFound("Notification"));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<usize, ServiceError> {
        Ok(self.db.mark_all_notifications_read(user_id).await?)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !self.db.delete_notification(user_id, id).await? {
            return Err(ServiceError::NotFound("Notification"));
        }
        Ok(())
    }

    pub async fn delete_all(&self, user_id: Uuid) -> Result<usize, ServiceError> {
        Ok(self.db.delete_all_notifications(user_id).await?)
    }

    /// Purge read notifications older than `days_old` days, for every user.
    pub async fn cleanup(&self, days_old: Option<i64>) -> Result<usize, ServiceError> {
        let days_old = days_old.unwrap_or(DEFAULT_CLEANUP_DAYS);
        if days_old < 0 {
            return Err(ServiceError::Validation(vec![FieldError::new(
                "daysOld",
                "Must not be negative",
            )]));
        }

        let cutoff = Duration::try_days(days_old)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or_else(|| {
                ServiceError::Validation(vec![FieldError::new("daysOld", "Too far in the past")])
            })?;
        let deleted = self.db.delete_read_notifications_before(cutoff).await?;
        info!(days_old, deleted, "🧹 Notification cleanup finished");
        Ok(deleted)
    }

    /// Collapse bursts of unread same-type notifications from the last 12 hours.
    ///
    /// Every type with more than three such entries keeps only its newest one,
    /// retitled with the group size; the rest are deleted.
    pub async fn aggregate(&self, user_id: Uuid) -> Result<AggregationReport, ServiceError> {
        let since = Utc::now() - Duration::hours(AGGREGATION_WINDOW_HOURS);
        let recent = self.db.unread_notifications_since(user_id, since).await?;

        // Newest first within each group, as returned by the store
        let mut groups: HashMap<NotificationType, Vec<Notification>> = HashMap::new();
        for n in recent {
            groups.entry(n.kind).or_default().push(n);
        }

        let mut report = AggregationReport::default();
        for (kind, group) in groups {
            if group.len() <= AGGREGATION_THRESHOLD {
                continue;
            }

            let count = group.len();
            let newest = &group[0];
            let title = format!("{} ({})", newest.title, count);
            let message = format!(
                "You have {} new notifications of this kind. Latest: {}",
                count, newest.message
            );
            let remove: Vec<Uuid> = group[1..].iter().map(|n| n.id).collect();

            let removed = self
                .db
                .collapse_notifications(newest.id, &title, &message, &remove)
                .await?;

            debug!(
                user_id = %user_id,
                kind = kind.as_str(),
                count,
                "Collapsed notification group"
            );
            report.groups_collapsed += 1;
            report.notifications_removed += removed;
        }

        if report.groups_collapsed > 0 {
            info!(
                user_id = %user_id,
                groups = report.groups_collapsed,
                removed = report.notifications_removed,
                "Notifications aggregated"
            );
        }
        Ok(report)
    }
}
