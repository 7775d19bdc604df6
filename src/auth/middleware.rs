//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and role checks

use crate::auth::{
    jwt::JwtHandler,
    models::{AuthUser, TokenUse, UserRole},
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Auth middleware that validates access tokens
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Absent and malformed headers are treated alike
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AuthError::MissingToken)?;

    // Refresh tokens are signed with another secret and fail here too
    let claims = jwt_handler
        .verify(bearer.token(), TokenUse::Access)
        .map_err(|e| {
            debug!("Rejected bearer token: {:#}", e);
            AuthError::InvalidToken
        })?;

    req.extensions_mut().insert(AuthUser::from(&claims));

    Ok(next.run(req).await)
}

/// Roles admitted by [`authorize_roles`]
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [UserRole]);

pub const ADMIN_ONLY: AllowedRoles = AllowedRoles(&[UserRole::Admin]);

/// Role gate, layered inside [`auth_middleware`]
pub async fn authorize_roles(
    State(allowed): State<AllowedRoles>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = req.extensions().get::<AuthUser>().copied();
    authorize(identity, allowed)?;
    Ok(next.run(req).await)
}

pub fn authorize(identity: Option<AuthUser>, allowed: AllowedRoles) -> Result<AuthUser, AuthError> {
    let user = identity.ok_or(AuthError::MissingToken)?;
    if !allowed.0.contains(&user.role) {
        warn!(
            user_id = %user.user_id,
            role = user.role.as_str(),
            "Insufficient privileges"
        );
        return Err(AuthError::InsufficientPrivileges);
    }
    Ok(user)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}

/// Auth error types
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    InsufficientPrivileges,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::InsufficientPrivileges => (StatusCode::FORBIDDEN, "Insufficient privileges"),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
