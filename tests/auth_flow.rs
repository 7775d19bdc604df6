mod common;

use axum::http::{Method, StatusCode};
use common::{spawn_app, spawn_app_with_limit};

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let res = app.request(Method::GET, "/health", None, None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "healthy");
}

#[tokio::test]
async fn login_sets_refresh_cookie_and_returns_access_token() {
    let app = spawn_app().await;
    assert_eq!(
        app.register("learner@roadbook.test", "password123").await.status,
        StatusCode::CREATED
    );

    let res = app.login("learner@roadbook.test", "password123").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["accessToken"].as_str().is_some());
    assert_eq!(res.body["user"]["email"], "learner@roadbook.test");
    assert!(res.body["user"].get("passwordHash").is_none());
    // Never in the body
    assert!(res.body.get("refreshToken").is_none());

    let cookie = res.set_cookie_header().unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn second_login_revokes_first_refresh_token() {
    let app = spawn_app().await;
    app.register("twice@roadbook.test", "password123").await;

    let first = app.login("twice@roadbook.test", "password123").await;
    let second = app.login("twice@roadbook.test", "password123").await;
    let first_cookie = first.refresh_cookie().unwrap();
    let second_cookie = second.refresh_cookie().unwrap();
    assert_ne!(first_cookie, second_cookie);

    let stale = app
        .request(Method::POST, "/auth/refresh", None, Some(&first_cookie), None)
        .await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let fresh = app
        .request(Method::POST, "/auth/refresh", None, Some(&second_cookie), None)
        .await;
    assert_eq!(fresh.status, StatusCode::OK);
    let access = fresh.body["accessToken"].as_str().unwrap();

    let me = app.get("/auth/me", access).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], "twice@roadbook.test");
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let app = spawn_app().await;
    app.register("known@roadbook.test", "password123").await;

    let wrong_password = app.login("known@roadbook.test", "wrong-password").await;
    let unknown_email = app.login("nobody@roadbook.test", "password123").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let app = spawn_app().await;
    assert_eq!(
        app.register("dup@roadbook.test", "password123").await.status,
        StatusCode::CREATED
    );
    assert_eq!(
        app.register("DUP@roadbook.test", "password123").await.status,
        StatusCode::CONFLICT
    );

    let bad = app.register("not-an-email", "short").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_login_body_is_json_bad_request() {
    let app = spawn_app().await;
    let res = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            None,
            Some(serde_json::json!({ "email": "a@b.fr" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.headers.get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(res.body["message"], "Invalid request body");
    assert_eq!(res.body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() {
    let app = spawn_app().await;
    let res = app
        .request(Method::POST, "/auth/refresh", None, None, None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.body["message"].is_string());
}

#[tokio::test]
async fn refresh_token_is_not_a_bearer_token() {
    let app = spawn_app().await;
    app.register("mixup@roadbook.test", "password123").await;
    let login = app.login("mixup@roadbook.test", "password123").await;
    let refresh = login.refresh_cookie().unwrap();

    assert_eq!(
        app.get("/auth/me", &refresh).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.request(Method::GET, "/auth/me", None, None, None)
            .await
            .status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn logout_revokes_and_clears_cookie() {
    let app = spawn_app().await;
    app.register("bye@roadbook.test", "password123").await;
    let login = app.login("bye@roadbook.test", "password123").await;
    let refresh = login.refresh_cookie().unwrap();

    let out = app
        .request(Method::POST, "/auth/logout", None, Some(&refresh), None)
        .await;
    assert_eq!(out.status, StatusCode::OK);
    let cleared = out.set_cookie_header().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let after = app
        .request(Method::POST, "/auth/refresh", None, Some(&refresh), None)
        .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    // Without any cookie logout still succeeds
    let anonymous = app
        .request(Method::POST, "/auth/logout", None, None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::OK);
}

#[tokio::test]
async fn auth_routes_are_rate_limited() {
    let app = spawn_app_with_limit(2).await;
    for _ in 0..2 {
        assert_eq!(
            app.login("nobody@roadbook.test", "password123").await.status,
            StatusCode::UNAUTHORIZED
        );
    }

    let limited = app.login("nobody@roadbook.test", "password123").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.get("retry-after").is_some());

    // Other routes are not counted
    let health = app.request(Method::GET, "/health", None, None, None).await;
    assert_eq!(health.status, StatusCode::OK);
}
