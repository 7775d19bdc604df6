//! Authentication API Endpoints
//! Mission: Register, login, token refresh and logout over HTTP

use crate::api::AppJson;
use crate::auth::models::{
    AuthUser, LoginRequest, LoginResponse, RefreshResponse, RegisterRequest, UserResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use tracing::{error, info};

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Register endpoint - POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": UserResponse::from_user(&user) })),
    ))
}

/// Login endpoint - POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::bad_request("email", "Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::bad_request("password", "Password is required"));
    }

    info!("🔐 Login attempt: {}", payload.email);
    let outcome = state.auth.login(&payload.email, &payload.password).await?;

    let max_age = state.auth.jwt().lifetimes().refresh.num_seconds();
    let cookie = Cookie::build((REFRESH_COOKIE, outcome.refresh_token.token))
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(max_age));

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user: UserResponse::from_user(&outcome.user),
            access_token: outcome.access_token.token,
            expires_at: outcome.access_token.expires_at,
        }),
    ))
}

/// Refresh endpoint - POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<RefreshResponse>, ApiError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::Authentication("Refresh token missing".to_string()))?;

    let issued = state.auth.refresh(&token).await?;
    Ok(Json(RefreshResponse {
        access_token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// Logout endpoint - POST /auth/logout. Always succeeds and clears the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    if let Err(e) = state.auth.logout(token.as_deref()).await {
        error!("Failed to revoke refresh token on logout: {}", e);
    }

    (
        jar.remove(Cookie::build(REFRESH_COOKIE).path("/")),
        Json(json!({ "message": "Logged out" })),
    )
}

/// Current user - GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.current_user(identity.user_id).await?;
    Ok(Json(json!({ "user": UserResponse::from_user(&user) })))
}
