//! Shared application state

use crate::auth::{AuthService, JwtHandler, TokenLifetimes};
use crate::badges::BadgeService;
use crate::config::RoadbookConfig;
use crate::notifications::NotificationService;
use crate::store::Database;
use anyhow::{Context, Result};
use chrono::Duration;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtHandler>,
    pub auth: Arc<AuthService>,
    pub badges: Arc<BadgeService>,
    pub notifications: Arc<NotificationService>,
    pub secure_cookies: bool,
}

impl AppState {
    /// Open storage, wire services and run first-boot setup.
    pub async fn build(config: &RoadbookConfig) -> Result<Self> {
        config.validate()?;

        let db = Database::open(&config.db_path)?;
        let jwt = Arc::new(JwtHandler::new(
            config.jwt_secret.clone(),
            config.jwt_refresh_secret.clone(),
            TokenLifetimes {
                access: Duration::minutes(config.access_token_ttl_minutes),
                refresh: Duration::days(config.refresh_token_ttl_days),
            },
        ));

        let auth = Arc::new(AuthService::new(db.clone(), jwt.clone(), config.bcrypt_cost)?);
        let notifications = Arc::new(NotificationService::new(db.clone()));
        let badges = Arc::new(BadgeService::new(db.clone(), config.badge_cache_ttl()));

        if config.seed_badges {
            badges
                .seed_default_catalog()
                .await
                .context("Failed to seed badge catalogue")?;
        }

        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            auth.ensure_admin(email, password, "Administrator").await?;
        }

        info!(
            production = config.production,
            "🔐 Authentication initialized (access {}m, refresh {}d)",
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days
        );

        Ok(Self {
            db,
            jwt,
            auth,
            badges,
            notifications,
            secure_cookies: config.production,
        })
    }
}
