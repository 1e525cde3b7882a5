//! Alert dispatch and throttling.
//!
//! A status transition becomes an [`AlertContext`]; the [`AlertDispatcher`]
//! fans it out to the monitor's channels through per-type
//! [`ChannelSender`]s, consulting the [`AlertThrottle`] for DOWN alerts.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::models::{Monitor, MonitorType};
use crate::monitoring::types::CheckStatus;

pub mod channels;
pub mod dispatcher;
pub mod message;
pub mod throttle;

pub use channels::{ChannelSender, Delivery, NoopSender, SenderError, TelegramSender};
pub use dispatcher::{AlertDispatcher, ChannelOutcome, DispatchSummary};
pub use throttle::{ALERT_THROTTLE_MINUTES, AlertThrottle, ThrottleRecord};

/// Everything a channel needs to describe a status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertContext {
    pub monitor_id: Uuid,
    pub owner_id: Uuid,
    pub monitor_name: String,
    pub monitor_type: MonitorType,
    pub status: CheckStatus,
    pub previous_status: Option<CheckStatus>,
    pub error_message: Option<String>,
    pub response_time_ms: Option<u64>,
    pub check_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AlertContext {
    pub fn for_monitor(monitor: &Monitor, status: CheckStatus, previous_status: Option<CheckStatus>) -> Self {
        Self {
            monitor_id: monitor.id,
            owner_id: monitor.owner_id,
            monitor_name: monitor.name.clone(),
            monitor_type: monitor.monitor_type(),
            status,
            previous_status,
            error_message: None,
            response_time_ms: None,
            check_url: monitor.config.check_url().map(str::to_owned),
            timestamp: Utc::now(),
        }
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error_message = error;
        self
    }

    pub fn with_response_time(mut self, response_time_ms: Option<u64>) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// DOWN → UP
    pub fn is_recovery(&self) -> bool {
        self.status == CheckStatus::Up && self.previous_status == Some(CheckStatus::Down)
    }

    /// A DOWN notification, the only kind subject to throttling
    pub fn is_down_alert(&self) -> bool {
        self.status == CheckStatus::Down
    }
}
