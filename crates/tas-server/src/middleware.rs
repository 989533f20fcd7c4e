use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

const MAX_REQUEST_ID_LEN: usize = 128;

/// Expired client windows are swept once the table reaches this size.
const SWEEP_AT: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter with one budget per client address.
///
/// Requests whose client cannot be identified share a single budget.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    trust_forwarded_for: bool,
    clients: Arc<Mutex<HashMap<Option<IpAddr>, ClientWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            trust_forwarded_for: false,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Key clients on the first `x-forwarded-for` hop instead of the peer.
    #[must_use]
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    fn client_of(&self, req: &Request) -> Option<IpAddr> {
        if self.trust_forwarded_for {
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|hop| hop.trim().parse::<IpAddr>().ok());
            if forwarded.is_some() {
                return forwarded;
            }
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    }

    /// Count one request for `client`. `Err` carries the time until its
    /// window reopens.
    async fn admit(&self, client: Option<IpAddr>, now: Instant) -> Result<(), Duration> {
        let mut clients = self.clients.lock().await;

        if clients.len() >= SWEEP_AT {
            clients.retain(|_, w| now.duration_since(w.started_at) < self.window);
        }

        let window = clients.entry(client).or_insert(ClientWindow {
            started_at: now,
            count: 0,
        });
        let elapsed = now.duration_since(window.started_at);
        if elapsed >= self.window {
            *window = ClientWindow {
                started_at: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            return Err(self.window.saturating_sub(elapsed));
        }
        window.count += 1;
        Ok(())
    }
}

fn usable_request_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw.bytes().all(|b| b.is_ascii_graphic())
}

/// Axum middleware that extracts or generates a request ID.
///
/// A well-formed incoming `x-request-id` (printable ASCII, at most 128 bytes)
/// is kept; anything else is replaced by a new `UUIDv4`. The ID is stored as
/// a [`RequestId`] extension and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| usable_request_id(v))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the per-client request budget.
///
/// Rejections use the API error envelope and carry `retry-after`.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = rate_limit.client_of(&req);

    if let Err(retry_in) = rate_limit.admit(client, Instant::now()).await {
        let retry_secs = retry_in.as_secs() + u64::from(retry_in.subsec_nanos() > 0);
        tracing::warn!(
            client = ?client,
            max_requests = rate_limit.max_requests,
            retry_secs,
            "rate limit exceeded"
        );

        let req_id = req
            .extensions()
            .get::<RequestId>()
            .map_or_else(String::new, |id| id.0.clone());
        let mut res = ApiError::new(req_id, "rate_limited", "too many requests").into_response();
        res.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs.max(1)));
        return res;
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn limited_app(limit: RateLimitState) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limit, enforce_rate_limit))
    }

    fn from_peer(ip: [u8; 4]) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/")
            .extension(ConnectInfo(SocketAddr::from((ip, 40_000))))
            .body(Body::empty())
            .unwrap()
    }

    async fn status_of(app: &Router, req: HttpRequest<Body>) -> StatusCode {
        app.clone().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn rate_limit_rejects_after_budget_is_spent() {
        let app = limited_app(RateLimitState::new(2, Duration::from_secs(60)));
        for _ in 0..2 {
            assert_eq!(status_of(&app, from_peer([10, 0, 0, 1])).await, StatusCode::OK);
        }

        let res = app.oneshot(from_peer([10, 0, 0, 1])).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry: u64 = res
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .expect("retry-after");
        assert!((1..=60).contains(&retry), "got {retry}");

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "rate_limited");
    }

    #[tokio::test]
    async fn each_client_gets_its_own_budget() {
        let app = limited_app(RateLimitState::new(1, Duration::from_secs(60)));
        assert_eq!(status_of(&app, from_peer([10, 0, 0, 1])).await, StatusCode::OK);
        assert_eq!(
            status_of(&app, from_peer([10, 0, 0, 1])).await,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_of(&app, from_peer([10, 0, 0, 2])).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn budget_refills_after_the_window() {
        let app = limited_app(RateLimitState::new(1, Duration::from_millis(30)));
        assert_eq!(status_of(&app, from_peer([10, 0, 0, 1])).await, StatusCode::OK);
        assert_eq!(
            status_of(&app, from_peer([10, 0, 0, 1])).await,
            StatusCode::TOO_MANY_REQUESTS
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(status_of(&app, from_peer([10, 0, 0, 1])).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn forwarded_for_is_ignored_unless_trusted() {
        let forwarded = |hop: &str| {
            let mut req = from_peer([10, 0, 0, 9]);
            req.headers_mut()
                .insert("x-forwarded-for", HeaderValue::from_str(hop).unwrap());
            req
        };

        let untrusted = limited_app(RateLimitState::new(1, Duration::from_secs(60)));
        assert_eq!(status_of(&untrusted, forwarded("203.0.113.1")).await, StatusCode::OK);
        assert_eq!(
            status_of(&untrusted, forwarded("203.0.113.2")).await,
            StatusCode::TOO_MANY_REQUESTS
        );

        let trusted = limited_app(
            RateLimitState::new(1, Duration::from_secs(60)).trust_forwarded_for(true),
        );
        assert_eq!(
            status_of(&trusted, forwarded("203.0.113.1, 10.0.0.9")).await,
            StatusCode::OK
        );
        assert_eq!(status_of(&trusted, forwarded("203.0.113.2")).await, StatusCode::OK);
        assert_eq!(
            status_of(&trusted, forwarded("203.0.113.1")).await,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn request_id_is_echoed_back() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id));
        let res = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header("x-request-id", "req-abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            res.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-abc")
        );
    }

    #[tokio::test]
    async fn oversized_request_id_is_replaced() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id));
        let res = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header("x-request-id", "x".repeat(MAX_REQUEST_ID_LEN + 1))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let id = res
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .expect("generated id");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn request_id_is_generated_when_missing() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id));
        let res = app
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = res
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .expect("generated id");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn request_id_rules() {
        assert!(usable_request_id("req-abc"));
        assert!(!usable_request_id(""));
        assert!(!usable_request_id("has space"));
    }
}
