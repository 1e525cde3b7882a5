use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::NewCheckResult;

/// Status of a monitoring check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Up,
    Down,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Up => "up",
            CheckStatus::Down => "down",
        }
    }

    /// Parse the stored column value
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "up" => Some(CheckStatus::Up),
            "down" => Some(CheckStatus::Down),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one probe execution, before it is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Timestamp when the check was performed
    pub checked_at: DateTime<Utc>,

    /// Status of the check (up/down)
    pub status: CheckStatus,

    /// Response time in milliseconds
    pub response_time_ms: Option<u64>,

    /// HTTP status code (if a response was received)
    pub http_status_code: Option<u16>,

    /// Error message (if check failed)
    pub error_message: Option<String>,

    /// Whether the expected keyword was found (if one was configured)
    pub matched_keyword: Option<bool>,
}

impl ProbeOutcome {
    /// Mark the check as successful with latency
    pub fn up(response_time_ms: u64, http_status_code: Option<u16>) -> Self {
        Self {
            checked_at: Utc::now(),
            status: CheckStatus::Up,
            response_time_ms: Some(response_time_ms),
            http_status_code,
            error_message: None,
            matched_keyword: None,
        }
    }

    /// Mark the check as failed with error
    pub fn down(response_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            checked_at: Utc::now(),
            status: CheckStatus::Down,
            response_time_ms: Some(response_time_ms),
            http_status_code: None,
            error_message: Some(error.into()),
            matched_keyword: None,
        }
    }

    pub fn with_status_code(mut self, code: u16) -> Self {
        self.http_status_code = Some(code);
        self
    }

    pub fn with_keyword_match(mut self, matched: bool) -> Self {
        self.matched_keyword = Some(matched);
        self
    }

    pub fn into_record(self, monitor_id: Uuid) -> NewCheckResult {
        NewCheckResult {
            monitor_id,
            status: self.status,
            response_time_ms: self.response_time_ms,
            http_status_code: self.http_status_code,
            error_message: self.error_message,
            checked_at: self.checked_at,
        }
    }
}
