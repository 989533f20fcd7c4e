use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("TAS_ENV", "development"))?;

    let bind_addr = or_default("TAS_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TAS_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("TAS_LOG_LEVEL", "info");
    let offices_path = PathBuf::from(or_default("TAS_OFFICES_PATH", "./config/offices.yaml"));

    let geo_high_accuracy = parse_bool("TAS_GEO_HIGH_ACCURACY", "false")?;
    let geo_timeout_ms = parse_u64("TAS_GEO_TIMEOUT_MS", "10000")?;
    if geo_timeout_ms == 0 {
        return Err(invalid("TAS_GEO_TIMEOUT_MS", "must be greater than 0".to_string()));
    }
    let geo_max_age_ms = parse_u64("TAS_GEO_MAX_AGE_MS", "300000")?;

    let whatsapp_country_code = or_default("TAS_WHATSAPP_COUNTRY_CODE", "91");
    if whatsapp_country_code.is_empty()
        || !whatsapp_country_code.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid(
            "TAS_WHATSAPP_COUNTRY_CODE",
            format!("expected digits only, got '{whatsapp_country_code}'"),
        ));
    }

    let rate_limit_per_minute = parse_usize("TAS_RATE_LIMIT_PER_MINUTE", "120")?;
    if rate_limit_per_minute == 0 {
        return Err(invalid(
            "TAS_RATE_LIMIT_PER_MINUTE",
            "must be greater than 0".to_string(),
        ));
    }
    let trust_forwarded_for = parse_bool("TAS_TRUST_FORWARDED_FOR", "false")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        offices_path,
        geo_high_accuracy,
        geo_timeout_ms,
        geo_max_age_ms,
        whatsapp_country_code,
        rate_limit_per_minute,
        trust_forwarded_for,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TAS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
