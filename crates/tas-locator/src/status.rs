use serde::Serialize;
use tas_core::Office;

/// Lifecycle of the location lookup as seen by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    Loading,
    Prompt,
    Granted,
    Denied,
    Unavailable,
}

impl std::fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationStatus::Loading => write!(f, "loading"),
            LocationStatus::Prompt => write!(f, "prompt"),
            LocationStatus::Granted => write!(f, "granted"),
            LocationStatus::Denied => write!(f, "denied"),
            LocationStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// What the resolver currently exposes to its page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub status: LocationStatus,
    /// `None` until the first resolution completes.
    pub office: Option<Office>,
    /// Only set while `status` is [`LocationStatus::Granted`].
    pub distance_km: Option<f64>,
    /// Banner suppressed for the rest of the session.
    pub dismissed: bool,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            status: LocationStatus::Loading,
            office: None,
            distance_km: None,
            dismissed: false,
        }
    }
}

impl Resolution {
    /// `true` when the office shown is the head-office fallback rather than a
    /// computed nearest office.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.office.is_some() && self.status != LocationStatus::Granted
    }
}
