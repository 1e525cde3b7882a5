use async_trait::async_trait;
use thiserror::Error;

use super::AlertContext;
use crate::database::models::ChannelConfig;

pub mod noop;
pub mod telegram;

pub use noop::NoopSender;
pub use telegram::TelegramSender;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Telegram bot not configured")]
    BotNotConfigured,
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// What a sender did with an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The channel type has no transport yet
    Skipped,
}

/// Transport for one channel type.
///
/// Implementations receive the channel's own configuration and render the
/// alert themselves.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, channel: &ChannelConfig, context: &AlertContext) -> Result<Delivery, SenderError>;
}
