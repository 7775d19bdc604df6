//! Auth Session Manager
//! Mission: Authenticate credentials and manage the refresh-token lifecycle

use crate::auth::jwt::{token_digest, JwtHandler};
use crate::auth::models::{
    IssuedToken, LoginOutcome, RefreshTokenRecord, RefreshTokenState, RegisterRequest, TokenUse,
    User, UserRole,
};
use crate::error::{FieldError, ServiceError};
use crate::store::{Database, Insert};
use anyhow::Context;
use bcrypt::{hash, verify};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

pub struct AuthService {
    db: Database,
    jwt: Arc<JwtHandler>,
    bcrypt_cost: u32,
    // Verified against when the email is unknown so both failure paths cost one bcrypt check
    dummy_hash: String,
}

impl AuthService {
    pub fn new(db: Database, jwt: Arc<JwtHandler>, bcrypt_cost: u32) -> anyhow::Result<Self> {
        let dummy_hash =
            hash("roadbook-unknown-account", bcrypt_cost).context("Failed to hash password")?;
        Ok(Self {
            db,
            jwt,
            bcrypt_cost,
            dummy_hash,
        })
    }

    pub fn jwt(&self) -> &Arc<JwtHandler> {
        &self.jwt
    }

    /// Create an account. Self-registration cannot claim the ADMIN role.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, ServiceError> {
        let email = req.email.trim().to_lowercase();
        let display_name = req.display_name.trim().to_string();
        let role = req.role.unwrap_or(UserRole::Apprentice);

        let mut errors = Vec::new();
        if !looks_like_email(&email) {
            errors.push(FieldError::new("email", "Must be a valid email address"));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if display_name.is_empty() {
            errors.push(FieldError::new("displayName", "Must not be empty"));
        }
        if role == UserRole::Admin {
            errors.push(FieldError::new("role", "ADMIN accounts cannot self-register"));
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let user = self.new_user(email, &req.password, display_name, role)?;
        match self.db.insert_user(&user).await? {
            Insert::Created(user) => {
                info!("✅ Registered user {} ({})", user.email, user.role.as_str());
                Ok(user)
            }
            Insert::Conflict => Err(ServiceError::EmailTaken),
        }
    }

    /// Verify credentials, revoke every previous refresh token of the user and
    /// issue a fresh access/refresh pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.db.find_user_by_email(&email).await? else {
            // Same work and same error as a wrong password
            let _ = verify(password, &self.dummy_hash);
            warn!("❌ Failed login attempt: {}", email);
            return Err(ServiceError::InvalidCredentials);
        };

        let valid = verify(password, &user.password_hash).context("Failed to verify password")?;
        if !valid {
            warn!("❌ Failed login attempt: {}", email);
            return Err(ServiceError::InvalidCredentials);
        }

        let access_token = self.jwt.issue_access(&user)?;
        let refresh_token = self.jwt.issue_refresh(&user)?;

        let record = RefreshTokenRecord {
            id: refresh_token.jti,
            token_digest: token_digest(&refresh_token.token),
            user_id: user.id,
            state: RefreshTokenState::Active,
            expires_at: refresh_token.expires_at,
            created_at: Utc::now(),
            revoked_at: None,
        };
        let revoked = self.db.replace_refresh_tokens(&record).await?;

        info!(
            user_id = %user.id,
            revoked_refresh_tokens = revoked,
            "✅ Login successful: {} ({})",
            user.email,
            user.role.as_str()
        );

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token. The refresh token
    /// itself is not rotated and stays valid until it expires or is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedToken, ServiceError> {
        let claims = self
            .jwt
            .verify(refresh_token, TokenUse::Refresh)
            .map_err(|_| ServiceError::InvalidOrExpiredToken)?;

        let record = self
            .db
            .find_active_refresh_token(&token_digest(refresh_token), Utc::now())
            .await?
            .ok_or(ServiceError::RevokedOrUnknownToken)?;

        // Role may have changed since login; sign with the stored one
        let user = self
            .db
            .find_user(record.user_id)
            .await?
            .ok_or(ServiceError::RevokedOrUnknownToken)?;

        if user.id != claims.user_id {
            warn!(
                token_user = %claims.user_id,
                record_user = %record.user_id,
                "Refresh token owner mismatch"
            );
            return Err(ServiceError::RevokedOrUnknownToken);
        }

        Ok(self.jwt.issue_access(&user)?)
    }

    /// Revoke the presented refresh token, if any. Unknown tokens are ignored.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<bool, ServiceError> {
        let Some(token) = refresh_token else {
            return Ok(false);
        };

        let revoked = self
            .db
            .revoke_refresh_token(&token_digest(token), Utc::now())
            .await?;
        if revoked {
            info!("🔒 Refresh token revoked on logout");
        }
        Ok(revoked)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Create the bootstrap admin account when it does not exist yet.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> anyhow::Result<bool> {
        let email = email.trim().to_lowercase();
        if self.db.find_user_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        let admin = self
            .new_user(email, password, display_name.to_string(), UserRole::Admin)
            .map_err(|e| anyhow::anyhow!(e))?;
        let created = matches!(self.db.insert_user(&admin).await?, Insert::Created(_));
        if created {
            info!("🔐 Bootstrap admin created: {}", admin.email);
        }
        Ok(created)
    }

    fn new_user(
        &self,
        email: String,
        password: &str,
        display_name: String,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        let password_hash =
            hash(password, self.bcrypt_cost).context("Failed to hash password")?;
        Ok(User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            display_name,
            role,
            created_at: Utc::now(),
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
