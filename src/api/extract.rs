//! Request extractors whose rejections use the API error shape

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json` that rejects malformed bodies with a JSON 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` that rejects bad query strings with a JSON 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Credentials {
        #[allow(dead_code)]
        email: String,
        #[allow(dead_code)]
        password: String,
    }

    #[derive(Deserialize)]
    struct Paging {
        #[allow(dead_code)]
        limit: Option<u32>,
    }

    fn app() -> Router {
        Router::new()
            .route("/login", post(|AppJson(_): AppJson<Credentials>| async { "ok" }))
            .route("/list", get(|AppQuery(_): AppQuery<Paging>| async { "ok" }))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_field_is_json_bad_request() {
        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@b.fr"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid request body");
        assert_eq!(body["errors"][0]["field"], "body");
        assert!(body["errors"][0]["message"]
            .as_str()
            .unwrap()
            .contains("password"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_bad_request() {
        let request = Request::post("/login")
            .body(Body::from(r#"{"email":"a@b.fr","password":"x"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn test_bad_query_is_json_bad_request() {
        let request = Request::get("/list?limit=lots").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["field"], "query");
    }
}
