//! Authentication Models
//! Mission: Define user identity, credential and token data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub display_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// User roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Apprentice, // Learner driver logging sessions
    Guide,      // Accompanying driver, validates sessions
    Instructor, // Professional instructor
    Admin,      // Badge catalogue and moderation
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Apprentice => "APPRENTICE",
            UserRole::Guide => "GUIDE",
            UserRole::Instructor => "INSTRUCTOR",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "APPRENTICE" => Some(UserRole::Apprentice),
            "GUIDE" => Some(UserRole::Guide),
            "INSTRUCTOR" => Some(UserRole::Instructor),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Which of the two credentials a token is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub role: UserRole,
    #[serde(rename = "use")]
    pub token_use: TokenUse,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Identity attached to a request once its bearer token is verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl From<&Claims> for AuthUser {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
        }
    }
}

/// Lifecycle of a stored refresh credential. No transition back to Active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshTokenState {
    Active,
    Revoked,
}

impl RefreshTokenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTokenState::Active => "ACTIVE",
            RefreshTokenState::Revoked => "REVOKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(RefreshTokenState::Active),
            "REVOKED" => Some(RefreshTokenState::Revoked),
            _ => None,
        }
    }
}

/// Server-side record of an issued refresh token
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub token_digest: String, // sha256 hex of the token, the token itself is never stored
    pub user_id: Uuid,
    pub state: RefreshTokenState,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// A signed token with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: Option<UserRole>,
}

/// Successful login: the refresh token travels as a cookie, never in the body
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Refresh response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}
