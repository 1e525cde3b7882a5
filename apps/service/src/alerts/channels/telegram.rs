use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{ChannelSender, Delivery, SenderError};
use crate::alerts::AlertContext;
use crate::alerts::message::format_chat_message;
use crate::database::models::ChannelConfig;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// A sender for pushing notifications via the Telegram Bot API.
pub struct TelegramSender {
    client: Client,
    api_base: String,
    default_token: Option<String>,
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

impl TelegramSender {
    pub fn new(default_token: Option<String>, api_base: impl Into<String>) -> anyhow::Result<Self> {
        let default_token = default_token.filter(|t| !t.trim().is_empty());
        if default_token.is_none() {
            tracing::warn!("Telegram bot token not configured, default Telegram alerts are disabled");
        }

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            default_token,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.default_token.is_some()
    }

    /// Post one message to a chat; a per-channel token wins over the default
    pub async fn send_text(&self, chat_id: &str, bot_token: Option<&str>, text: &str) -> Result<(), SenderError> {
        let token = bot_token
            .filter(|t| !t.trim().is_empty())
            .or(self.default_token.as_deref())
            .ok_or(SenderError::BotNotConfigured)?;

        let api_url = format!("{}/bot{token}/sendMessage", self.api_base);
        let payload = TelegramMessage { chat_id, text, parse_mode: "Markdown", disable_web_page_preview: true };

        let response = self.client.post(&api_url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "Telegram API returned non-success status: {status}. Body: {error_body}"
            )));
        }

        tracing::debug!("Telegram message delivered to chat {}", chat_id);
        Ok(())
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    async fn send(&self, channel: &ChannelConfig, context: &AlertContext) -> Result<Delivery, SenderError> {
        let ChannelConfig::Telegram { chat_id, bot_token } = channel else {
            return Err(SenderError::InvalidConfiguration(
                "Expected Telegram config, but found a different type.".to_string(),
            ));
        };

        let text = format_chat_message(context);
        self.send_text(chat_id, bot_token.as_deref(), &text).await?;
        Ok(Delivery::Sent)
    }
}
