//! Runtime configuration
//! Mission: One place for every knob, read from flags or the environment

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use std::time::Duration;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";
pub const DEV_JWT_REFRESH_SECRET: &str = "dev-refresh-secret-change-in-production-32-chars";

#[derive(Parser, Debug, Clone)]
#[command(name = "roadbook")]
#[command(about = "RoadBook backend: accounts, sessions, badges and notifications")]
pub struct RoadbookConfig {
    /// Address the HTTP server binds to
    #[arg(long, env = "ROADBOOK_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// SQLite database file, or :memory:
    #[arg(long, env = "ROADBOOK_DB_PATH", default_value = "roadbook.db")]
    pub db_path: String,

    /// Secret signing access tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Secret signing refresh tokens
    #[arg(
        long,
        env = "JWT_REFRESH_SECRET",
        default_value = DEV_JWT_REFRESH_SECRET,
        hide_env_values = true
    )]
    pub jwt_refresh_secret: String,

    #[arg(long, env = "ACCESS_TOKEN_TTL_MINUTES", default_value = "15")]
    pub access_token_ttl_minutes: i64,

    #[arg(long, env = "REFRESH_TOKEN_TTL_DAYS", default_value = "7")]
    pub refresh_token_ttl_days: i64,

    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Secure cookies and no error details in responses
    #[arg(long, env = "ROADBOOK_PRODUCTION", default_value = "false", action = ArgAction::Set)]
    pub production: bool,

    /// Bootstrap admin created on startup when missing
    #[arg(long, env = "ROADBOOK_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[arg(long, env = "ROADBOOK_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Auth requests allowed per client IP per window
    #[arg(long, env = "AUTH_RATE_LIMIT_MAX", default_value = "20")]
    pub auth_rate_limit_max: u32,

    #[arg(long, env = "AUTH_RATE_LIMIT_WINDOW_SECS", default_value = "60")]
    pub auth_rate_limit_window_secs: u64,

    #[arg(long, env = "BADGE_CACHE_TTL_SECS", default_value = "60")]
    pub badge_cache_ttl_secs: u64,

    /// Seed the default badge catalogue into an empty database
    #[arg(long, env = "ROADBOOK_SEED_BADGES", default_value = "true", action = ArgAction::Set)]
    pub seed_badges: bool,
}

impl RoadbookConfig {
    pub fn validate(&self) -> Result<()> {
        if self.access_token_ttl_minutes <= 0 {
            bail!("ACCESS_TOKEN_TTL_MINUTES must be positive");
        }
        if self.refresh_token_ttl_days <= 0 {
            bail!("REFRESH_TOKEN_TTL_DAYS must be positive");
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        if self.auth_rate_limit_window_secs == 0 {
            bail!("AUTH_RATE_LIMIT_WINDOW_SECS must be positive");
        }
        if self.jwt_secret == self.jwt_refresh_secret {
            bail!("JWT_SECRET and JWT_REFRESH_SECRET must differ");
        }
        if self.admin_email.is_some() != self.admin_password.is_some() {
            bail!("ROADBOOK_ADMIN_EMAIL and ROADBOOK_ADMIN_PASSWORD must be set together");
        }
        if self.production {
            if self.jwt_secret == DEV_JWT_SECRET || self.jwt_refresh_secret == DEV_JWT_REFRESH_SECRET
            {
                bail!("Development JWT secrets cannot be used in production");
            }
            if self.jwt_secret.len() < 32 || self.jwt_refresh_secret.len() < 32 {
                bail!("JWT secrets must be at least 32 characters in production");
            }
        }
        Ok(())
    }

    pub fn badge_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.badge_cache_ttl_secs)
    }

    pub fn auth_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.auth_rate_limit_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid_for_development() {
        let config = RoadbookConfig::parse_from(["roadbook"]);
        assert_eq!(config.access_token_ttl_minutes, 15);
        assert_eq!(config.refresh_token_ttl_days, 7);
        assert!(!config.production);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_dev_secrets() {
        let config = RoadbookConfig::parse_from(["roadbook", "--production", "true"]);
        assert!(config.validate().is_err());

        let config = RoadbookConfig::parse_from([
            "roadbook",
            "--production",
            "true",
            "--jwt-secret",
            "a-very-long-access-secret-for-production-use",
            "--jwt-refresh-secret",
            "a-very-long-refresh-secret-for-production-use",
        ]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_admin_credentials_come_in_pairs() {
        let config =
            RoadbookConfig::parse_from(["roadbook", "--admin-email", "root@roadbook.test"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let config = RoadbookConfig::parse_from(["roadbook", "--bcrypt-cost", "3"]);
        assert!(config.validate().is_err());
    }
}
