//! Platform capabilities the resolver depends on.
//!
//! Each one is a trait so a browser bridge, a native sensor, or a test fake
//! can stand behind it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tas_core::Coordinates;
use tokio::sync::watch;

/// Session key under which the banner dismissal is remembered.
pub const DISMISSED_KEY: &str = "locationBannerDismissed";

/// Parameters passed to every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// A cached fix no older than this is acceptable.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

impl PositionOptions {
    #[must_use]
    pub fn from_app_config(config: &tas_core::AppConfig) -> Self {
        Self {
            enable_high_accuracy: config.geo_high_accuracy,
            timeout: config.geo_timeout(),
            maximum_age: config.geo_max_age(),
        }
    }
}

/// Error codes reported by a position source, numbered like the W3C
/// `GeolocationPositionError` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Current grant for the location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; asking for a position would show a permission prompt.
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("permission query failed: {0}")]
pub struct PermissionQueryError(pub String);

/// One-shot access to the device position.
pub trait PositionSource: Send + Sync {
    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, PositionError>> + Send;
}

/// Read access to the location permission grant.
pub trait PermissionSource: Send + Sync {
    fn query(&self) -> impl Future<Output = Result<PermissionState, PermissionQueryError>> + Send;

    /// Change notifications, if the platform can observe them.
    fn subscribe(&self) -> Option<watch::Receiver<PermissionState>> {
        None
    }
}

/// String store scoped to the current browsing session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Placeholder for a capability the platform does not provide. Use it as the
/// type parameter when passing `None` for a position or permission source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl PositionSource for Unsupported {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        Err(PositionError::new(
            PositionErrorCode::PositionUnavailable,
            "position source unsupported",
        ))
    }
}

impl PermissionSource for Unsupported {
    async fn query(&self) -> Result<PermissionState, PermissionQueryError> {
        Err(PermissionQueryError("permission query unsupported".to_string()))
    }
}

/// Process-local [`SessionStore`]. Clones share the same map, so a session
/// outlives any single resolver and ends when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry, as when a new session starts.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

/// A position source that always answers with the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

impl PositionSource for FixedPosition {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        Ok(self.0)
    }
}

/// A permission source that always reports the same grant.
#[derive(Debug, Clone, Copy)]
pub struct FixedPermission(pub PermissionState);

impl PermissionSource for FixedPermission {
    async fn query(&self) -> Result<PermissionState, PermissionQueryError> {
        Ok(self.0)
    }
}
