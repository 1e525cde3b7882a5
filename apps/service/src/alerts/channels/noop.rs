use async_trait::async_trait;

use super::{ChannelSender, Delivery, SenderError};
use crate::alerts::AlertContext;
use crate::database::models::ChannelConfig;

/// Sender for channel types without a transport (Discord, Slack, email)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSender;

#[async_trait]
impl ChannelSender for NoopSender {
    async fn send(&self, channel: &ChannelConfig, context: &AlertContext) -> Result<Delivery, SenderError> {
        tracing::debug!(
            "{} alerts not yet implemented, skipping monitor {}",
            channel.channel_type(),
            context.monitor_id
        );
        Ok(Delivery::Skipped)
    }
}
