use thiserror::Error;

use crate::capability::{PositionError, PositionErrorCode};
use crate::status::LocationStatus;

/// Reasons a nearest office could not be resolved from the user's position.
///
/// Only [`LocateError::EmptyOfficeList`] ever leaves the resolver; the rest are
/// absorbed into a degraded status with the head office as fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("location capability is not available on this platform")]
    CapabilityAbsent,

    #[error("location permission denied: {0}")]
    PermissionDenied(String),

    #[error("timed out waiting for a position fix")]
    AcquisitionTimeout,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("office list is empty; at least one office must be configured")]
    EmptyOfficeList,
}

impl LocateError {
    /// Status exposed to the page once this failure has been absorbed.
    #[must_use]
    pub fn status(&self) -> LocationStatus {
        match self {
            LocateError::PermissionDenied(_) => LocationStatus::Denied,
            LocateError::CapabilityAbsent
            | LocateError::AcquisitionTimeout
            | LocateError::PositionUnavailable(_)
            | LocateError::EmptyOfficeList => LocationStatus::Unavailable,
        }
    }
}

impl From<PositionError> for LocateError {
    fn from(err: PositionError) -> Self {
        match err.code {
            PositionErrorCode::PermissionDenied => LocateError::PermissionDenied(err.message),
            PositionErrorCode::PositionUnavailable => LocateError::PositionUnavailable(err.message),
            PositionErrorCode::Timeout => LocateError::AcquisitionTimeout,
        }
    }
}

impl From<tas_core::CoreError> for LocateError {
    fn from(err: tas_core::CoreError) -> Self {
        match err {
            tas_core::CoreError::EmptyOfficeList => LocateError::EmptyOfficeList,
        }
    }
}
