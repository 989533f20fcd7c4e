mod contact;
mod nearest_branch;
mod offices;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tas_core::{OfficeDirectory, PrimaryContact};
use tas_locator::PositionOptions;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub offices: OfficeDirectory,
    pub primary_contact: Option<PrimaryContact>,
    pub whatsapp_country_code: String,
    pub position_options: PositionOptions,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    offices: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Parse an optional `lat`/`lng` query pair.
///
/// Both absent is `Ok(None)`; one without the other, unparsable numbers, or
/// out-of-range values are validation errors.
pub(super) fn parse_coordinates(
    request_id: &str,
    lat: Option<&str>,
    lng: Option<&str>,
) -> Result<Option<tas_core::Coordinates>, ApiError> {
    let invalid = |message: String| ApiError::new(request_id, "validation_error", message);

    let (lat, lng) = match (lat, lng) {
        (None, None) => return Ok(None),
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(invalid("lat and lng must be given together".to_string())),
    };

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| invalid(format!("lat is not a number: '{lat}'")))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| invalid(format!("lng is not a number: '{lng}'")))?;

    let point = tas_core::Coordinates::new(lat, lng);
    if !point.is_valid() {
        return Err(invalid(format!(
            "coordinates out of range: ({lat}, {lng})"
        )));
    }
    Ok(Some(point))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let limited_routes = Router::new()
        .route("/api/v1/offices", get(offices::list_offices))
        .route("/api/v1/offices/nearest", get(offices::nearest_office))
        .route("/api/v1/offices/{id}", get(offices::get_office))
        .route(
            "/api/v1/nearest-branch",
            get(nearest_branch::resolve_nearest_branch),
        )
        .route("/api/v1/contact", get(contact::get_primary_contact))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(limited_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            offices: state.offices.len(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub fn default_rate_limit_state(max_per_minute: usize) -> RateLimitState {
    RateLimitState::new(max_per_minute, Duration::from_secs(60))
}
