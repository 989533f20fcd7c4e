use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub offices_path: PathBuf,
    /// Ask the position source for a high-accuracy fix.
    pub geo_high_accuracy: bool,
    pub geo_timeout_ms: u64,
    /// Oldest cached fix the position source may hand back.
    pub geo_max_age_ms: u64,
    pub whatsapp_country_code: String,
    /// Requests allowed per client per minute.
    pub rate_limit_per_minute: usize,
    /// Key rate limits on `x-forwarded-for` instead of the peer address.
    pub trust_forwarded_for: bool,
}

impl AppConfig {
    #[must_use]
    pub fn geo_timeout(&self) -> Duration {
        Duration::from_millis(self.geo_timeout_ms)
    }

    #[must_use]
    pub fn geo_max_age(&self) -> Duration {
        Duration::from_millis(self.geo_max_age_ms)
    }
}
