//! Badge API Endpoints

use crate::api::AppJson;
use crate::auth::models::AuthUser;
use crate::badges::models::{AwardRequest, Badge, CheckResponse, EarnedBadge, NewBadge};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// GET /badges
pub async fn list_badges(State(state): State<AppState>) -> Result<Json<Vec<Badge>>, ApiError> {
    Ok(Json(state.badges.list().await?))
}

/// GET /badges/:id
pub async fn get_badge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Badge>, ApiError> {
    let badge_id = ApiError::parse_id("id", &id)?;
    Ok(Json(state.badges.get(badge_id).await?))
}

/// POST /badges (admin)
pub async fn create_badge(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewBadge>,
) -> Result<impl IntoResponse, ApiError> {
    let badge = state.badges.create(payload).await?;
    Ok((StatusCode::CREATED, Json(badge)))
}

/// GET /badges/me
pub async fn my_badges(
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<Json<Vec<EarnedBadge>>, ApiError> {
    Ok(Json(state.badges.user_badges(identity.user_id).await?))
}

/// GET /badges/users/:id
pub async fn user_badges(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EarnedBadge>>, ApiError> {
    let user_id = ApiError::parse_id("userId", &id)?;
    Ok(Json(state.badges.user_badges(user_id).await?))
}

/// POST /badges/check-mine
pub async fn check_mine(
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<Json<CheckResponse>, ApiError> {
    let awarded = state.badges.check_and_award(identity.user_id).await?;
    Ok(Json(CheckResponse {
        count: awarded.len(),
        awarded,
    }))
}

/// POST /badges/award (admin)
pub async fn award_badge(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AwardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = ApiError::parse_id("userId", &payload.user_id)?;
    let badge_id = ApiError::parse_id("badgeId", &payload.badge_id)?;

    let award = state.badges.award(user_id, badge_id).await?;
    Ok((StatusCode::CREATED, Json(award)))
}

/// DELETE /badges/:id/:badge_id (admin). The first segment is the user id.
pub async fn revoke_badge(
    State(state): State<AppState>,
    Path((user, badge)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = ApiError::parse_id("userId", &user)?;
    let badge_id = ApiError::parse_id("badgeId", &badge)?;

    let removed = state.badges.revoke(user_id, badge_id).await?;
    Ok(Json(json!({ "message": "Badge revoked", "removed": removed })))
}
