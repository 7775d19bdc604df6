//! Rate limiting middleware.
//!
//! Fixed-window request counting per client IP, applied to the auth routes.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

/// Request counters keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Allowed,
    Limited { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn check(&self, ip: IpAddr, now: Instant) -> Decision {
        let mut windows = self.windows.lock();
        let window = windows.entry(ip).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.config.window {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        if window.count > self.config.max_requests {
            let reset_at = window.started + self.config.window;
            Decision::Limited {
                retry_after: reset_at.saturating_duration_since(now),
            }
        } else {
            Decision::Allowed
        }
    }

    /// Drop expired windows (call from a background task).
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.config.window;
        self.windows
            .lock()
            .retain(|_, w| now.duration_since(w.started) < window);
    }

    pub fn window(&self) -> Duration {
        self.config.window
    }
}

/// Client IP from the socket, else the first X-Forwarded-For entry.
pub fn client_ip(connect_info: Option<&ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> IpAddr {
    if let Some(ConnectInfo(addr)) = connect_info {
        return addr.ip();
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(connect_info.as_ref(), request.headers());

    match limiter.check(ip, Instant::now()) {
        Decision::Allowed => next.run(request).await,
        Decision::Limited { retry_after } => {
            let retry_secs = retry_after.as_secs().max(1);
            warn!(
                ip = %ip,
                path = %request.uri().path(),
                retry_after_secs = retry_secs,
                "Rate limit exceeded"
            );

            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_secs.to_string())],
                Json(serde_json::json!({
                    "message": "Too many requests. Please slow down.",
                    "retryAfterSeconds": retry_secs,
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn test_limit_applies_per_ip() {
        let limiter = limiter(3);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        let now = Instant::now();

        for _ in 0..3 {
            assert_eq!(limiter.check(a, now), Decision::Allowed);
        }
        assert!(matches!(limiter.check(a, now), Decision::Limited { .. }));
        assert_eq!(limiter.check(b, now), Decision::Allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(1);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let start = Instant::now();

        assert_eq!(limiter.check(ip, start), Decision::Allowed);
        assert!(matches!(limiter.check(ip, start), Decision::Limited { .. }));
        assert_eq!(
            limiter.check(ip, start + Duration::from_secs(61)),
            Decision::Allowed
        );
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            client_ip(None, &headers),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(
            client_ip(None, &headers),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );

        let socket: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        assert_eq!(
            client_ip(Some(&ConnectInfo(socket)), &headers),
            socket.ip()
        );
    }
}
