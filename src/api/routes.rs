use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::{api as auth_api, auth_middleware, authorize_roles, ADMIN_ONLY};
use crate::badges::api as badges_api;
use crate::middleware::{rate_limit_middleware, request_logging, RateLimiter};
use crate::notifications::api as notifications_api;
use crate::state::AppState;

/// Create the API router
pub fn build_router(state: AppState, limiter: RateLimiter) -> Router {
    // Credential endpoints, rate limited per client IP
    let auth_routes = Router::new()
        .route("/auth/register", post(auth_api::register))
        .route("/auth/login", post(auth_api::login))
        .route("/auth/refresh", post(auth_api::refresh))
        .route("/auth/logout", post(auth_api::logout))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    let admin_routes = Router::new()
        .route("/badges", post(badges_api::create_badge))
        .route("/badges/award", post(badges_api::award_badge))
        .route("/badges/:id/:badge_id", delete(badges_api::revoke_badge))
        .route("/notifications/cleanup", post(notifications_api::cleanup))
        .route_layer(middleware::from_fn_with_state(ADMIN_ONLY, authorize_roles));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth_api::me))
        .route("/badges", get(badges_api::list_badges))
        .route("/badges/me", get(badges_api::my_badges))
        .route("/badges/check-mine", post(badges_api::check_mine))
        .route("/badges/users/:id", get(badges_api::user_badges))
        .route("/badges/:id", get(badges_api::get_badge))
        .route(
            "/notifications",
            get(notifications_api::list_notifications).delete(notifications_api::delete_all),
        )
        .route(
            "/notifications/unread-count",
            get(notifications_api::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(notifications_api::mark_all_read),
        )
        .route("/notifications/aggregate", post(notifications_api::aggregate))
        .route("/notifications/:id/read", put(notifications_api::mark_read))
        .route(
            "/notifications/:id",
            delete(notifications_api::delete_notification),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.db.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            warn!("Health check failed: {:#}", e);
            "degraded"
        }
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}
