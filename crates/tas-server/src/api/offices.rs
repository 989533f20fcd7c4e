use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tas_core::{format_distance, tel_link, whatsapp_link, Contact, Coordinates, Office};

use crate::middleware::RequestId;

use super::{parse_coordinates, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ContactItem {
    pub name: String,
    pub phone: String,
    pub is_primary: bool,
    pub tel_url: String,
    pub whatsapp_url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct OfficeItem {
    pub id: String,
    pub name: String,
    pub maps_url: String,
    pub coordinates: Coordinates,
    pub contacts: Vec<ContactItem>,
    pub display_contact: Option<ContactItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct NearestOfficeItem {
    pub office: OfficeItem,
    pub distance_km: f64,
    pub distance_label: String,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct NearestQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

impl ContactItem {
    pub(super) fn from_contact(contact: &Contact, country_code: &str) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            is_primary: contact.is_primary,
            tel_url: tel_link(&contact.phone),
            whatsapp_url: whatsapp_link(&contact.phone, None, country_code),
        }
    }
}

impl OfficeItem {
    pub(super) fn from_office(office: &Office, country_code: &str) -> Self {
        Self {
            id: office.id.clone(),
            name: office.name.clone(),
            maps_url: office.maps_url.clone(),
            coordinates: office.coordinates,
            contacts: office
                .contacts
                .iter()
                .map(|c| ContactItem::from_contact(c, country_code))
                .collect(),
            display_contact: office
                .display_contact()
                .map(|c| ContactItem::from_contact(c, country_code)),
        }
    }
}

pub(super) async fn list_offices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<OfficeItem>>> {
    let data = state
        .offices
        .iter()
        .map(|office| OfficeItem::from_office(office, &state.whatsapp_country_code))
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn get_office(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OfficeItem>>, ApiError> {
    let Some(office) = state.offices.get(&id) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("office '{id}' not found"),
        ));
    };

    Ok(Json(ApiResponse {
        data: OfficeItem::from_office(office, &state.whatsapp_country_code),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn nearest_office(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<NearestQuery>,
) -> Result<Json<ApiResponse<NearestOfficeItem>>, ApiError> {
    let point = parse_coordinates(&req_id.0, params.lat.as_deref(), params.lng.as_deref())?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "lat and lng are required",
            )
        })?;

    let (office, distance_km) = state.offices.nearest(point);

    Ok(Json(ApiResponse {
        data: NearestOfficeItem {
            office: OfficeItem::from_office(office, &state.whatsapp_country_code),
            distance_km,
            distance_label: format_distance(distance_km),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
