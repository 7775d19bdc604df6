//! Badge Eligibility Evaluator
//! Mission: Award badges whose criteria a user's driving history satisfies

use crate::badges::catalog::BadgeCatalog;
use crate::badges::criteria::CriteriaTag;
use crate::badges::models::{Badge, EarnedBadge, NewBadge, UserBadge};
use crate::error::{FieldError, ServiceError};
use crate::notifications::models::{Notification, NotificationType};
use crate::store::{Database, Insert};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct BadgeService {
    db: Database,
    catalog: BadgeCatalog,
}

impl BadgeService {
    pub fn new(db: Database, catalog_ttl: Duration) -> Self {
        Self {
            db,
            catalog: BadgeCatalog::new(catalog_ttl),
        }
    }

    pub async fn list(&self) -> Result<Vec<Badge>, ServiceError> {
        Ok(self.catalog.get(&self.db).await?.as_ref().clone())
    }

    pub async fn get(&self, badge_id: Uuid) -> Result<Badge, ServiceError> {
        self.db
            .find_badge(badge_id)
            .await?
            .ok_or(ServiceError::NotFound("Badge"))
    }

    pub async fn user_badges(&self, user_id: Uuid) -> Result<Vec<EarnedBadge>, ServiceError> {
        if self.db.find_user(user_id).await?.is_none() {
            return Err(ServiceError::NotFound("User"));
        }
        Ok(self.db.list_user_badges(user_id).await?)
    }

    /// Define a new badge. Unknown criteria tags are refused here, so only
    /// hand-edited rows can carry one.
    pub async fn create(&self, new: NewBadge) -> Result<Badge, ServiceError> {
        let criteria = CriteriaTag::parse(&new.criteria);

        let mut errors = Vec::new();
        if new.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Must not be empty"));
        }
        if new.category.trim().is_empty() {
            errors.push(FieldError::new("category", "Must not be empty"));
        }
        if !criteria.is_known() {
            errors.push(FieldError::new(
                "criteria",
                format!("Unknown criteria tag {}", criteria),
            ));
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let badge = Badge {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            description: new.description,
            image_url: new.image_url,
            category: new.category.trim().to_string(),
            criteria,
            created_at: Utc::now(),
        };

        match self.db.insert_badge(&badge).await? {
            Insert::Created(badge) => {
                self.catalog.invalidate();
                info!("🏅 Badge defined: {} ({})", badge.name, badge.criteria);
                Ok(badge)
            }
            Insert::Conflict => Err(ServiceError::BadgeNameTaken),
        }
    }

    /// Grant a badge. A second award of the same pair is an `AlreadyAwarded` error.
    pub async fn award(&self, user_id: Uuid, badge_id: Uuid) -> Result<UserBadge, ServiceError> {
        if self.db.find_user(user_id).await?.is_none() {
            return Err(ServiceError::NotFound("User"));
        }
        let badge = self.get(badge_id).await?;

        match self.grant(user_id, &badge).await? {
            Some(award) => Ok(award),
            None => Err(ServiceError::AlreadyAwarded),
        }
    }

    /// Remove an award. Revoking a badge the user does not hold is a no-op.
    pub async fn revoke(&self, user_id: Uuid, badge_id: Uuid) -> Result<usize, ServiceError> {
        let deleted = self.db.delete_user_badge(user_id, badge_id).await?;
        if deleted > 0 {
            info!(user_id = %user_id, badge_id = %badge_id, "Badge revoked");
        }
        Ok(deleted)
    }

    /// Evaluate every badge the user does not hold yet and award the satisfied ones.
    /// Returns only the badges awarded by this call.
    pub async fn check_and_award(&self, user_id: Uuid) -> Result<Vec<Badge>, ServiceError> {
        let held = self.db.held_badge_ids(user_id).await?;
        let catalog = self.catalog.get(&self.db).await?;
        let history = self.db.load_history_snapshot(user_id).await?;

        let mut awarded = Vec::new();
        for badge in catalog.iter().filter(|b| !held.contains(&b.id)) {
            if let CriteriaTag::Unknown(tag) = &badge.criteria {
                warn!(
                    badge_id = %badge.id,
                    badge = %badge.name,
                    "Unknown badge criteria tag {}",
                    tag
                );
                continue;
            }
            if !badge.criteria.is_satisfied(&history) {
                continue;
            }

            // A concurrent award of the same pair wins; skip it silently
            if self.grant(user_id, badge).await?.is_some() {
                awarded.push(badge.clone());
            } else {
                debug!(badge = %badge.name, "Badge awarded concurrently, skipped");
            }
        }

        Ok(awarded)
    }

    /// Seed one badge per known criteria tag when no badge is defined.
    pub async fn seed_default_catalog(&self) -> Result<usize, ServiceError> {
        if self.db.count_badges().await? > 0 {
            return Ok(0);
        }

        let mut seeded = 0;
        for tag in CriteriaTag::KNOWN {
            let (name, description, category) = default_definition(&tag);
            let badge = Badge {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: description.to_string(),
                image_url: Some(format!(
                    "/images/badges/{}.png",
                    tag.as_str().to_lowercase()
                )),
                category: category.to_string(),
                criteria: tag,
                created_at: Utc::now(),
            };
            if let Insert::Created(_) = self.db.insert_badge(&badge).await? {
                seeded += 1;
            }
        }

        self.catalog.invalidate();
        info!("🏅 Seeded {} default badges", seeded);
        Ok(seeded)
    }

    async fn grant(&self, user_id: Uuid, badge: &Badge) -> Result<Option<UserBadge>, ServiceError> {
        let notice = Notification::new(
            user_id,
            NotificationType::BadgeEarned,
            "New badge earned!",
            format!(
                "Congratulations! You earned the \"{}\" badge: {}",
                badge.name, badge.description
            ),
            Some("/badges/me".to_string()),
        );

        let award = match self
            .db
            .insert_user_badge(user_id, badge.id, Utc::now(), &notice)
            .await?
        {
            Insert::Created(award) => award,
            Insert::Conflict => return Ok(None),
        };

        info!(user_id = %user_id, "🏅 Badge awarded: {}", badge.name);
        Ok(Some(award))
    }
}

fn default_definition(tag: &CriteriaTag) -> (&'static str, &'static str, &'static str) {
    match tag {
        CriteriaTag::FirstSession => (
            "First Drive",
            "Log your first driving session",
            "MILESTONE",
        ),
        CriteriaTag::Complete10Sessions => (
            "Regular Driver",
            "Complete 10 driving sessions",
            "MILESTONE",
        ),
        CriteriaTag::NightDriving => ("Night Owl", "Drive at night", "EXPERIENCE"),
        CriteriaTag::HighwayDriving => ("Highway Star", "Drive on a highway", "EXPERIENCE"),
        CriteriaTag::MasterParking => (
            "Parking Pro",
            "Master a parking manoeuvre",
            "SKILL",
        ),
        CriteriaTag::MasterEcoDriving => (
            "Eco Driver",
            "Master every eco-driving competency",
            "SKILL",
        ),
        CriteriaTag::Validate10Sessions => (
            "Trusted Guide",
            "Validate 10 driving sessions as a guide",
            "MENTOR",
        ),
        CriteriaTag::CompleteRoadbook => (
            "Roadbook Complete",
            "Complete a roadbook",
            "MILESTONE",
        ),
        CriteriaTag::Unknown(_) => ("Unknown", "", "OTHER"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{User, UserRole};
    use crate::models::DrivingSession;

    async fn setup() -> (BadgeService, Database, Uuid) {
        let db = Database::in_memory().unwrap();
        let user = User {
            id: Uuid::new_v4(),
            email: "learner@roadbook.test".to_string(),
            password_hash: "hash".to_string(),
            display_name: "Learner".to_string(),
            role: UserRole::Apprentice,
            created_at: Utc::now(),
        };
        db.insert_user(&user).await.unwrap();
        let service = BadgeService::new(db.clone(), Duration::from_secs(60));
        (service, db, user.id)
    }

    fn new_badge(name: &str, criteria: &str) -> NewBadge {
        NewBadge {
            name: name.to_string(),
            description: "test".to_string(),
            image_url: None,
            category: "MILESTONE".to_string(),
            criteria: criteria.to_string(),
        }
    }

    async fn log_sessions(db: &Database, user: Uuid, count: usize) {
        for _ in 0..count {
            db.insert_session(&DrivingSession::completed(user, Utc::now()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_check_and_award_is_idempotent() {
        let (service, db, user) = setup().await;
        service.seed_default_catalog().await.unwrap();
        log_sessions(&db, user, 1).await;

        let first = service.check_and_award(user).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].criteria, CriteriaTag::FirstSession);

        let second = service.check_and_award(user).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(db.list_user_badges(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ten_sessions_award_second_badge() {
        let (service, db, user) = setup().await;
        service.seed_default_catalog().await.unwrap();

        log_sessions(&db, user, 1).await;
        service.check_and_award(user).await.unwrap();

        log_sessions(&db, user, 9).await;
        let awarded = service.check_and_award(user).await.unwrap();
        assert_eq!(awarded.len(), 1);
        assert_eq!(awarded[0].criteria, CriteriaTag::Complete10Sessions);
    }

    #[tokio::test]
    async fn test_award_emits_one_notification() {
        let (service, db, user) = setup().await;
        let badge = service
            .create(new_badge("Night Owl", "NIGHT_DRIVING"))
            .await
            .unwrap();

        service.award(user, badge.id).await.unwrap();
        let err = service.award(user, badge.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyAwarded));
        assert_eq!(err.to_string(), "User already has this badge");

        let notes = db.list_notifications(user, false, 50).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationType::BadgeEarned);
        assert!(notes[0].message.contains("Night Owl"));
    }

    #[tokio::test]
    async fn test_award_missing_user_or_badge() {
        let (service, _, user) = setup().await;
        let badge = service
            .create(new_badge("First Drive", "FIRST_SESSION"))
            .await
            .unwrap();

        assert!(matches!(
            service.award(Uuid::new_v4(), badge.id).await,
            Err(ServiceError::NotFound("User"))
        ));
        assert!(matches!(
            service.award(user, Uuid::new_v4()).await,
            Err(ServiceError::NotFound("Badge"))
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_silent_and_allows_reaward() {
        let (service, db, user) = setup().await;
        let badge = service
            .create(new_badge("First Drive", "FIRST_SESSION"))
            .await
            .unwrap();

        assert_eq!(service.revoke(user, badge.id).await.unwrap(), 0);

        service.award(user, badge.id).await.unwrap();
        assert_eq!(service.revoke(user, badge.id).await.unwrap(), 1);
        service.award(user, badge.id).await.unwrap();

        // Two awards, no notification for the revoke
        assert_eq!(db.list_notifications(user, false, 50).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_criteria_never_awarded() {
        let (service, db, user) = setup().await;
        let odd = Badge {
            id: Uuid::new_v4(),
            name: "Moon Driver".to_string(),
            description: String::new(),
            image_url: None,
            category: "OTHER".to_string(),
            criteria: CriteriaTag::Unknown("MOON_DRIVING".to_string()),
            created_at: Utc::now(),
        };
        db.insert_badge(&odd).await.unwrap();
        log_sessions(&db, user, 20).await;

        assert!(service.check_and_award(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_validation_and_duplicate_name() {
        let (service, _, _) = setup().await;
        let err = service
            .create(new_badge("", "FLYING"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["name", "criteria"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        service
            .create(new_badge("Night Owl", "NIGHT_DRIVING"))
            .await
            .unwrap();
        assert!(matches!(
            service.create(new_badge("Night Owl", "NIGHT_DRIVING")).await,
            Err(ServiceError::BadgeNameTaken)
        ));
    }

    #[tokio::test]
    async fn test_seed_only_into_empty_catalogue() {
        let (service, _, _) = setup().await;
        assert_eq!(service.seed_default_catalog().await.unwrap(), 8);
        assert_eq!(service.seed_default_catalog().await.unwrap(), 0);
        assert_eq!(service.list().await.unwrap().len(), 8);
    }
}
