//! Shared harness for router-level tests: an in-memory app driven with oneshot.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use clap::Parser;
use roadbook_backend::{
    api::build_router,
    config::RoadbookConfig,
    middleware::{RateLimitConfig, RateLimiter},
    state::AppState,
};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@roadbook.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Value of the `refreshToken` cookie set by this response, if any.
    pub fn refresh_cookie(&self) -> Option<String> {
        self.set_cookie_header()
            .and_then(|c| c.split(';').next().map(str::to_string))
            .and_then(|pair| pair.strip_prefix("refreshToken=").map(str::to_string))
    }

    pub fn set_cookie_header(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("refreshToken="))
            .map(str::to_string)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_limit(1_000).await
}

pub async fn spawn_app_with_limit(max_requests: u32) -> TestApp {
    let config = RoadbookConfig::parse_from([
        "roadbook",
        "--db-path",
        ":memory:",
        "--bcrypt-cost",
        "4",
        "--jwt-secret",
        "integration-access-secret",
        "--jwt-refresh-secret",
        "integration-refresh-secret",
        "--admin-email",
        ADMIN_EMAIL,
        "--admin-password",
        ADMIN_PASSWORD,
    ]);
    let state = AppState::build(&config).await.unwrap();
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests,
        window: Duration::from_secs(60),
    });

    TestApp {
        router: build_router(state.clone(), limiter),
        state,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, format!("refreshToken={}", value));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, bearer: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(bearer), None, None).await
    }

    pub async fn post(&self, uri: &str, bearer: &str, body: Option<Value>) -> TestResponse {
        self.request(Method::POST, uri, Some(bearer), None, body).await
    }

    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/auth/register",
            None,
            None,
            Some(serde_json::json!({
                "email": email,
                "password": password,
                "displayName": "Learner",
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/auth/login",
            None,
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register and log in; returns (access token, user id).
    pub async fn signed_in_learner(&self, email: &str) -> (String, uuid::Uuid) {
        assert_eq!(
            self.register(email, "password123").await.status,
            StatusCode::CREATED
        );
        let login = self.login(email, "password123").await;
        assert_eq!(login.status, StatusCode::OK);
        token_and_id(&login)
    }

    pub async fn signed_in_admin(&self) -> String {
        let login = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK);
        token_and_id(&login).0
    }
}

fn token_and_id(login: &TestResponse) -> (String, uuid::Uuid) {
    let token = login.body["accessToken"].as_str().unwrap().to_string();
    let id = login.body["user"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}
