use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    SessionReminder,
    SessionValidated,
    CompetencyMastered,
    BadgeEarned,
    CommentReceived,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::SessionReminder => "SESSION_REMINDER",
            NotificationType::SessionValidated => "SESSION_VALIDATED",
            NotificationType::CompetencyMastered => "COMPETENCY_MASTERED",
            NotificationType::BadgeEarned => "BADGE_EARNED",
            NotificationType::CommentReceived => "COMMENT_RECEIVED",
            NotificationType::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SESSION_REMINDER" => Some(NotificationType::SessionReminder),
            "SESSION_VALIDATED" => Some(NotificationType::SessionValidated),
            "COMPETENCY_MASTERED" => Some(NotificationType::CompetencyMastered),
            "BADGE_EARNED" => Some(NotificationType::BadgeEarned),
            "COMMENT_RECEIVED" => Some(NotificationType::CommentReceived),
            "SYSTEM" => Some(NotificationType::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            link,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupQuery {
    pub days_old: Option<i64>,
}

/// Outcome of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub groups_collapsed: usize,
    pub notifications_removed: usize,
}
