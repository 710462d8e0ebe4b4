use std::env;
use std::time::Duration;

use crate::engine::matching::MatchingSettings;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub nearby_radius_meters: f64,
    pub store_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            nearby_radius_meters: parse_or_default("NEARBY_RADIUS_METERS", 5_000.0)?,
            store_timeout_ms: parse_or_default("STORE_TIMEOUT_MS", 2_000)?,
        })
    }

    pub fn matching_settings(&self) -> MatchingSettings {
        MatchingSettings {
            default_radius_meters: self.nearby_radius_meters,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
