//! JWT Token Handler
//! Mission: Sign and verify access and refresh tokens

use crate::auth::models::{Claims, IssuedToken, TokenUse, User};
use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

/// Token lifetimes
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(7),
        }
    }
}

/// JWT Handler for token operations.
///
/// Access and refresh tokens are signed with separate secrets, so one can
/// never be verified as the other.
pub struct JwtHandler {
    access_secret: String,
    refresh_secret: String,
    lifetimes: TokenLifetimes,
}

impl JwtHandler {
    pub fn new(access_secret: String, refresh_secret: String, lifetimes: TokenLifetimes) -> Self {
        Self {
            access_secret,
            refresh_secret,
            lifetimes,
        }
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    pub fn issue_access(&self, user: &User) -> Result<IssuedToken> {
        self.issue(user, TokenUse::Access)
    }

    pub fn issue_refresh(&self, user: &User) -> Result<IssuedToken> {
        self.issue(user, TokenUse::Refresh)
    }

    fn issue(&self, user: &User, token_use: TokenUse) -> Result<IssuedToken> {
        let now = Utc::now();
        let lifetime = match token_use {
            TokenUse::Access => self.lifetimes.access,
            TokenUse::Refresh => self.lifetimes.refresh,
        };
        let expires_at = now
            .checked_add_signed(lifetime)
            .context("Invalid timestamp")?;

        let claims = Claims {
            user_id: user.id,
            role: user.role,
            token_use,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        debug!(
            user_id = %user.id,
            token_use = ?token_use,
            "Signing token, expires at {}",
            expires_at
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(token_use).as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok(IssuedToken {
            token,
            jti: claims.jti,
            expires_at,
        })
    }

    /// Validate a token of the expected kind and extract its claims
    pub fn verify(&self, token: &str, expected: TokenUse) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(expected).as_bytes()),
            &validation,
        )
        .context("Invalid or expired token")?;

        if decoded.claims.token_use != expected {
            bail!("Token is not a {:?} token", expected);
        }

        Ok(decoded.claims)
    }

    fn secret(&self, token_use: TokenUse) -> &str {
        match token_use {
            TokenUse::Access => &self.access_secret,
            TokenUse::Refresh => &self.refresh_secret,
        }
    }
}

/// SHA-256 hex digest under which a refresh token is stored
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
