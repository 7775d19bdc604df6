//! Notification API Endpoints

use crate::api::AppQuery;
use crate::auth::models::AuthUser;
use crate::error::ApiError;
use crate::notifications::models::{AggregationReport, CleanupQuery, ListQuery, Notification};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// GET /notifications?unreadOnly&limit
pub async fn list_notifications(
    State(state): State<AppState>,
    identity: AuthUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = state
        .notifications
        .list(
            identity.user_id,
            query.unread_only.unwrap_or(false),
            query.limit,
        )
        .await?;
    Ok(Json(notifications))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.notifications.unread_count(identity.user_id).await?;
    Ok(Json(json!({ "count": count })))
}

/// PUT /notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    identity: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ApiError::parse_id("id", &id)?;
    state.notifications.mark_read(identity.user_id, id).await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}

/// PUT /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.notifications.mark_all_read(identity.user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// DELETE /notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    identity: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ApiError::parse_id("id", &id)?;
    state.notifications.delete(identity.user_id, id).await?;
    Ok(Json(json!({ "message": "Notification deleted" })))
}

/// DELETE /notifications
pub async fn delete_all(
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.notifications.delete_all(identity.user_id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// POST /notifications/aggregate
pub async fn aggregate(
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<Json<AggregationReport>, ApiError> {
    Ok(Json(state.notifications.aggregate(identity.user_id).await?))
}

/// POST /notifications/cleanup?daysOld (admin)
pub async fn cleanup(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CleanupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.notifications.cleanup(query.days_old).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
