pub mod app_config;
pub mod config;
pub mod contact;
pub mod geo;
pub mod offices;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use contact::{tel_link, whatsapp_link, DEFAULT_COUNTRY_CODE};
pub use geo::{distance_km, format_distance, nearest_office, nearest_with_distance, EARTH_RADIUS_KM};
pub use offices::{
    load_offices, Contact, Coordinates, Office, OfficeDirectory, OfficesFile, PrimaryContact,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("office list is empty; at least one office must be configured")]
    EmptyOfficeList,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read offices file {path}: {source}")]
    OfficesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse offices file: {0}")]
    OfficesFileParse(#[source] serde_yaml::Error),

    #[error("offices config validation failed: {0}")]
    Validation(String),
}
