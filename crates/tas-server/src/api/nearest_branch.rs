//! Server-side run of the nearest-branch resolver for clients that report
//! their own location and permission answer.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tas_core::{format_distance, Coordinates, OfficeDirectory};
use tas_locator::{
    Banner, FixedPermission, FixedPosition, LocationStatus, MemorySessionStore,
    NearestBranchResolver, PermissionState, PositionOptions, PositionSource, Resolution,
    Unsupported,
};

use crate::middleware::RequestId;

use super::offices::OfficeItem;
use super::{parse_coordinates, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize, Default)]
pub(super) struct NearestBranchQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub permission: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct NearestBranchItem {
    pub status: LocationStatus,
    pub office: Option<OfficeItem>,
    pub distance_km: Option<f64>,
    pub distance_label: Option<String>,
    pub banner: Banner,
}

fn parse_permission(request_id: &str, raw: Option<&str>) -> Result<Option<PermissionState>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "granted" => Ok(Some(PermissionState::Granted)),
        "denied" => Ok(Some(PermissionState::Denied)),
        "prompt" => Ok(Some(PermissionState::Prompt)),
        other => Err(ApiError::new(
            request_id,
            "validation_error",
            format!("permission must be granted, denied or prompt; got '{other}'"),
        )),
    }
}

async fn resolve<P: PositionSource>(
    offices: OfficeDirectory,
    position: Option<P>,
    permission: Option<PermissionState>,
    options: PositionOptions,
) -> Resolution {
    let resolver = NearestBranchResolver::new(
        offices,
        position,
        permission.map(FixedPermission),
        MemorySessionStore::new(),
    )
    .with_options(options);
    resolver.mount().await;
    resolver.snapshot()
}

/// A missing location is treated as a platform without positioning.
pub(super) async fn resolve_nearest_branch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<NearestBranchQuery>,
) -> Result<Json<ApiResponse<NearestBranchItem>>, ApiError> {
    let point: Option<Coordinates> =
        parse_coordinates(&req_id.0, params.lat.as_deref(), params.lng.as_deref())?;
    let permission = parse_permission(&req_id.0, params.permission.as_deref())?;

    let offices = state.offices.clone();
    let resolution = match point {
        Some(point) => {
            resolve(
                offices,
                Some(FixedPosition(point)),
                permission,
                state.position_options,
            )
            .await
        }
        None => resolve(offices, None::<Unsupported>, permission, state.position_options).await,
    };

    tracing::debug!(
        status = %resolution.status,
        office = resolution.office.as_ref().map_or("", |o| o.id.as_str()),
        "nearest branch resolved"
    );

    let banner = resolution.banner();
    let country_code = state.whatsapp_country_code.as_str();

    Ok(Json(ApiResponse {
        data: NearestBranchItem {
            status: resolution.status,
            office: resolution
                .office
                .as_ref()
                .map(|o| OfficeItem::from_office(o, country_code)),
            distance_km: resolution.distance_km,
            distance_label: resolution.distance_km.map(format_distance),
            banner,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
