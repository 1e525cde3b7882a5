use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monitoring::types::CheckStatus;

pub const DEFAULT_HTTP_INTERVAL_MINUTES: u32 = 5;
pub const DEFAULT_GRACE_PERIOD_MINUTES: u32 = 5;
pub const DEFAULT_CRON_INTERVAL_MINUTES: u32 = 60;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Kind of monitor, mirrored by the `type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorType {
    Http,
    Cron,
    Ssl,
}

impl MonitorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorType::Http => "http",
            MonitorType::Cron => "cron",
            MonitorType::Ssl => "ssl",
        }
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_status_codes() -> Vec<u16> {
    vec![200]
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

fn default_cron_interval() -> u32 {
    DEFAULT_CRON_INTERVAL_MINUTES
}

/// Parameters of a single HTTP probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProbeConfig {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default = "default_status_codes")]
    pub expected_status_codes: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_keyword: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    #[serde(default = "default_true", rename = "validateSSL")]
    pub validate_ssl: bool,
}

impl HttpProbeConfig {
    /// Probe config with every optional field at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            body: None,
            expected_status_codes: default_status_codes(),
            expected_keyword: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            follow_redirects: true,
            validate_ssl: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronConfig {
    #[serde(default = "default_cron_interval")]
    pub expected_interval_minutes: u32,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self { expected_interval_minutes: DEFAULT_CRON_INTERVAL_MINUTES }
    }
}

/// Reserved: certificate expiry checks are not scheduled yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslConfig {
    pub url: String,
    #[serde(default)]
    pub alert_days_before_expiry: Vec<u32>,
}

/// Per-type probe parameters, stored as JSON in the `config` column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MonitorConfig {
    Http(HttpProbeConfig),
    Cron(CronConfig),
    Ssl(SslConfig),
}

impl MonitorConfig {
    pub fn monitor_type(&self) -> MonitorType {
        match self {
            MonitorConfig::Http(_) => MonitorType::Http,
            MonitorConfig::Cron(_) => MonitorType::Cron,
            MonitorConfig::Ssl(_) => MonitorType::Ssl,
        }
    }

    /// URL shown in alerts, when the monitor has one
    pub fn check_url(&self) -> Option<&str> {
        match self {
            MonitorConfig::Http(http) => Some(http.url.as_str()),
            MonitorConfig::Ssl(ssl) => Some(ssl.url.as_str()),
            MonitorConfig::Cron(_) => None,
        }
    }
}

/// Monitor model - a configured target whose liveness is tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub config: MonitorConfig,
    /// HTTP cadence in minutes
    pub interval_minutes: Option<u32>,
    /// CRON tolerance in minutes
    pub grace_period_minutes: Option<u32>,
    pub is_paused: bool,
    pub last_ping_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Monitor {
    /// Create a new, unpaused monitor with type defaults applied
    pub fn new(owner_id: Uuid, name: impl Into<String>, config: MonitorConfig) -> Self {
        let now = Utc::now();
        let (interval_minutes, grace_period_minutes) = match config.monitor_type() {
            MonitorType::Http => (Some(DEFAULT_HTTP_INTERVAL_MINUTES), None),
            MonitorType::Cron => (None, Some(DEFAULT_GRACE_PERIOD_MINUTES)),
            MonitorType::Ssl => (None, None),
        };
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            config,
            interval_minutes,
            grace_period_minutes,
            is_paused: false,
            last_ping_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn monitor_type(&self) -> MonitorType {
        self.config.monitor_type()
    }

    /// HTTP cadence, falling back to `default` when unset or zero
    pub fn interval_or(&self, default: u32) -> u32 {
        self.interval_minutes.filter(|m| *m > 0).unwrap_or(default)
    }

    /// CRON grace period, falling back to `default` when unset or zero
    pub fn grace_period_or(&self, default: u32) -> u32 {
        self.grace_period_minutes.filter(|m| *m > 0).unwrap_or(default)
    }
}

/// Convert a timestamp to the millisecond integer stored in the database
pub fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Convert a stored millisecond integer back to a timestamp
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// A check outcome about to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckResult {
    pub monitor_id: Uuid,
    pub status: CheckStatus,
    pub response_time_ms: Option<u64>,
    pub http_status_code: Option<u16>,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl NewCheckResult {
    pub fn up(monitor_id: Uuid, checked_at: DateTime<Utc>) -> Self {
        Self {
            monitor_id,
            status: CheckStatus::Up,
            response_time_ms: None,
            http_status_code: None,
            error_message: None,
            checked_at,
        }
    }

    pub fn down(monitor_id: Uuid, error: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            monitor_id,
            status: CheckStatus::Down,
            response_time_ms: None,
            http_status_code: None,
            error_message: Some(error.into()),
            checked_at,
        }
    }
}

/// Persisted, immutable check outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: i64,
    pub monitor_id: Uuid,
    pub status: CheckStatus,
    pub response_time_ms: Option<u64>,
    pub http_status_code: Option<u16>,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// A continuous DOWN period for one monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub monitor_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Incident {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Telegram,
    Discord,
    Slack,
    Email,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelType::Telegram => "telegram",
            ChannelType::Discord => "discord",
            ChannelType::Slack => "slack",
            ChannelType::Email => "email",
        };
        f.write_str(name)
    }
}

/// Channel-specific destination settings, stored as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelConfig {
    #[serde(rename_all = "camelCase")]
    Telegram {
        chat_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bot_token: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Discord { webhook_url: String },
    #[serde(rename_all = "camelCase")]
    Slack { webhook_url: String },
    Email { address: String },
}

impl ChannelConfig {
    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelConfig::Telegram { .. } => ChannelType::Telegram,
            ChannelConfig::Discord { .. } => ChannelType::Discord,
            ChannelConfig::Slack { .. } => ChannelType::Slack,
            ChannelConfig::Email { .. } => ChannelType::Email,
        }
    }
}

/// Alert destination attached to a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertChannel {
    pub id: i64,
    pub monitor_id: Uuid,
    pub config: ChannelConfig,
    pub is_active: bool,
}

impl AlertChannel {
    pub fn channel_type(&self) -> ChannelType {
        self.config.channel_type()
    }
}

/// Owner of monitors; only the fields the engine needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub telegram_chat_id: Option<String>,
}
