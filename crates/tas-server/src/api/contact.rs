use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tas_core::{tel_link, whatsapp_link};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Opening line for chats started from the site.
pub(super) const DEFAULT_GREETING: &str =
    "Hi, I'm visiting your website and would like to inquire about products.";

#[derive(Debug, Serialize)]
pub(super) struct PrimaryContactItem {
    pub name: String,
    pub phone: String,
    pub tel_url: String,
    pub whatsapp_url: String,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct ContactQuery {
    pub message: Option<String>,
}

/// Site-wide contact. Without a configured one, the head office's display
/// contact stands in.
pub(super) async fn get_primary_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ContactQuery>,
) -> Result<Json<ApiResponse<PrimaryContactItem>>, ApiError> {
    let message = params
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_GREETING);
    let country_code = state.whatsapp_country_code.as_str();

    let data = if let Some(primary) = &state.primary_contact {
        PrimaryContactItem {
            name: primary.name.clone(),
            phone: primary.phone.clone(),
            tel_url: tel_link(&primary.phone),
            whatsapp_url: whatsapp_link(&primary.whatsapp, Some(message), country_code),
        }
    } else {
        let Some(contact) = state.offices.head_office().display_contact() else {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                "no contact configured",
            ));
        };
        PrimaryContactItem {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            tel_url: tel_link(&contact.phone),
            whatsapp_url: whatsapp_link(&contact.phone, Some(message), country_code),
        }
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
