use crate::badges::criteria::CriteriaTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Badge definition, shared by every user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: String,
    #[serde(with = "criteria_serde")]
    pub criteria: CriteriaTag,
    pub created_at: DateTime<Utc>,
}

/// Award of one badge to one user. Unique per (user, badge) in storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub awarded_at: DateTime<Utc>,
}

/// A held badge together with its definition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    #[serde(flatten)]
    pub badge: Badge,
    pub awarded_at: DateTime<Utc>,
}

/// Admin request to define a new badge
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: String,
    pub criteria: String,
}

/// Admin request to award a badge manually
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    pub user_id: String,
    pub badge_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub awarded: Vec<Badge>,
    pub count: usize,
}

mod criteria_serde {
    use super::CriteriaTag;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tag: &CriteriaTag, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(tag.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<CriteriaTag, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(CriteriaTag::parse(&raw))
    }
}
