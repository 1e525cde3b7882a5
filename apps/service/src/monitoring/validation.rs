//! Monitor-type specific validation.
//!
//! Runs at the configuration boundary (monitor create/update, test probe),
//! so executors can trust the typed config they receive.

use thiserror::Error;
use url::Url;

use super::checker::{MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};
use crate::database::models::{CronConfig, HttpProbeConfig, Monitor, MonitorConfig, SslConfig};

const MAX_HEADERS: usize = 20;
const MAX_HEADER_SIZE: usize = 8192;
const MAX_BODY_SIZE: usize = 1024 * 1024;
const MAX_CRON_INTERVAL_MINUTES: u32 = 10_080; // one week
const MAX_INTERVAL_MINUTES: u32 = 1_440; // one day

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid scheme '{0}'. Must be http or https")]
    InvalidScheme(String),

    #[error("Timeout out of range: {0} ms (allowed: 1000-60000 ms)")]
    TimeoutOutOfRange(u64),

    #[error("Too many headers: {0} (max: 20)")]
    TooManyHeaders(usize),

    #[error("Header too large: {0} bytes (max: 8192 bytes)")]
    HeaderTooLarge(usize),

    #[error("Body too large: {0} bytes (max: 1048576 bytes)")]
    BodyTooLarge(usize),

    #[error("Invalid expected status code: {0}")]
    InvalidStatusCode(u16),

    #[error("Expected interval out of range: {0} minutes (allowed: 1-10080)")]
    CronIntervalOutOfRange(u32),

    #[error("{field} out of range: {value} minutes (allowed: 1-1440)")]
    MinutesOutOfRange { field: &'static str, value: u32 },

    #[error("Monitor name cannot be empty")]
    EmptyName,
}

/// Validate a whole monitor record
pub fn validate_monitor(monitor: &Monitor) -> Result<(), ValidationError> {
    if monitor.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    // Zero means "use the default", so only explicit values are range-checked.
    if let Some(interval) = monitor.interval_minutes.filter(|m| *m > 0) {
        validate_minutes("Check interval", interval)?;
    }
    if let Some(grace) = monitor.grace_period_minutes.filter(|m| *m > 0) {
        validate_minutes("Grace period", grace)?;
    }

    validate_config(&monitor.config)
}

/// Validate per-type probe parameters
pub fn validate_config(config: &MonitorConfig) -> Result<(), ValidationError> {
    match config {
        MonitorConfig::Http(http) => validate_http_config(http),
        MonitorConfig::Cron(cron) => validate_cron_config(cron),
        MonitorConfig::Ssl(ssl) => validate_ssl_config(ssl),
    }
}

pub fn validate_http_config(config: &HttpProbeConfig) -> Result<(), ValidationError> {
    validate_http_url(&config.url)?;

    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&config.timeout_ms) {
        return Err(ValidationError::TimeoutOutOfRange(config.timeout_ms));
    }

    if config.headers.len() > MAX_HEADERS {
        return Err(ValidationError::TooManyHeaders(config.headers.len()));
    }
    for (key, value) in &config.headers {
        if key.len() + value.len() > MAX_HEADER_SIZE {
            return Err(ValidationError::HeaderTooLarge(key.len() + value.len()));
        }
    }

    if let Some(body) = &config.body {
        if body.len() > MAX_BODY_SIZE {
            return Err(ValidationError::BodyTooLarge(body.len()));
        }
    }

    if let Some(code) = config.expected_status_codes.iter().find(|c| !(100..=599).contains(*c)) {
        return Err(ValidationError::InvalidStatusCode(*code));
    }

    Ok(())
}

fn validate_cron_config(config: &CronConfig) -> Result<(), ValidationError> {
    if config.expected_interval_minutes == 0 || config.expected_interval_minutes > MAX_CRON_INTERVAL_MINUTES {
        return Err(ValidationError::CronIntervalOutOfRange(config.expected_interval_minutes));
    }
    Ok(())
}

fn validate_ssl_config(config: &SslConfig) -> Result<(), ValidationError> {
    validate_http_url(&config.url)
}

/// Validate HTTP/HTTPS URL endpoint
pub fn validate_http_url(target: &str) -> Result<(), ValidationError> {
    if target.trim().is_empty() {
        return Err(ValidationError::InvalidUrl("target cannot be empty".into()));
    }

    let url = Url::parse(target).map_err(|e| {
        if target.contains("://") {
            ValidationError::InvalidUrl(e.to_string())
        } else {
            ValidationError::InvalidUrl("URL must include scheme (http:// or https://)".into())
        }
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::InvalidScheme(other.to_string())),
    }

    if url.host_str().is_none() {
        return Err(ValidationError::InvalidUrl("URL must have a valid host".into()));
    }

    if url.port() == Some(0) {
        return Err(ValidationError::InvalidUrl("Port 0 is not valid".into()));
    }

    Ok(())
}

fn validate_minutes(field: &'static str, value: u32) -> Result<(), ValidationError> {
    if value == 0 || value > MAX_INTERVAL_MINUTES {
        return Err(ValidationError::MinutesOutOfRange { field, value });
    }
    Ok(())
}
