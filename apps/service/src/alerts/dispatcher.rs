use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::AlertContext;
use super::channels::{ChannelSender, Delivery, NoopSender};
use super::throttle::AlertThrottle;
use crate::database::Database;
use crate::database::models::{ChannelConfig, ChannelType};

/// Result of one channel delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    /// `None` for the owner's default chat
    pub channel_id: Option<i64>,
    pub channel_type: ChannelType,
    pub delivery: Option<Delivery>,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn success(&self) -> bool {
        self.delivery == Some(Delivery::Sent)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub outcomes: Vec<ChannelOutcome>,
    pub throttled: bool,
}

impl DispatchSummary {
    fn throttled() -> Self {
        Self { outcomes: Vec::new(), throttled: true }
    }

    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success()).count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    /// Nothing was attempted and nothing was throttled
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty() && !self.throttled
    }
}

/// Fans alerts out to a monitor's channels
pub struct AlertDispatcher {
    database: Arc<dyn Database>,
    throttle: Arc<AlertThrottle>,
    senders: HashMap<ChannelType, Arc<dyn ChannelSender>>,
    fallback: Arc<dyn ChannelSender>,
}

impl AlertDispatcher {
    pub fn new(database: Arc<dyn Database>, throttle: Arc<AlertThrottle>) -> Self {
        Self { database, throttle, senders: HashMap::new(), fallback: Arc::new(NoopSender) }
    }

    /// Register the transport for a channel type
    pub fn with_sender(mut self, channel_type: ChannelType, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(channel_type, sender);
        self
    }

    pub fn throttle(&self) -> &Arc<AlertThrottle> {
        &self.throttle
    }

    fn sender_for(&self, channel_type: ChannelType) -> Arc<dyn ChannelSender> {
        self.senders.get(&channel_type).cloned().unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Owner's default chat, used when the monitor has no Telegram channel
    ///
    /// A failed lookup only fails the dispatch when nothing else could be sent.
    async fn owner_chat(&self, context: &AlertContext, has_other_channels: bool) -> Result<Option<String>> {
        let owner = match self.database.get_owner(context.owner_id).await {
            Ok(owner) => owner,
            Err(e) if has_other_channels => {
                warn!("Owner lookup failed for monitor {}, skipping default chat: {:#}", context.monitor_id, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(owner.and_then(|owner| owner.telegram_chat_id).filter(|chat| !chat.trim().is_empty()))
    }

    /// Deliver an alert to every active channel of the monitor
    ///
    /// Channel failures are captured in the summary; only persistence
    /// lookups produce an `Err`.
    pub async fn dispatch(&self, context: &AlertContext) -> Result<DispatchSummary> {
        let monitor_id = context.monitor_id;
        let channels = self.database.get_active_alert_channels(monitor_id).await?;

        let mut targets: Vec<(Option<i64>, ChannelConfig)> =
            channels.into_iter().map(|c| (Some(c.id), c.config)).collect();

        if !targets.iter().any(|(_, c)| c.channel_type() == ChannelType::Telegram) {
            if let Some(chat_id) = self.owner_chat(context, !targets.is_empty()).await? {
                targets.push((None, ChannelConfig::Telegram { chat_id, bot_token: None }));
            }
        }

        if targets.is_empty() {
            debug!("No active alert channels for monitor {}", monitor_id);
            return Ok(DispatchSummary::default());
        }

        if context.is_down_alert() && self.throttle.is_throttled(monitor_id) {
            debug!("Alert throttled for monitor {}", monitor_id);
            return Ok(DispatchSummary::throttled());
        }

        let deliveries = targets.iter().map(|(channel_id, config)| {
            let sender = self.sender_for(config.channel_type());
            async move {
                let channel_type = config.channel_type();
                match sender.send(config, context).await {
                    Ok(delivery) => {
                        ChannelOutcome { channel_id: *channel_id, channel_type, delivery: Some(delivery), error: None }
                    }
                    Err(e) => {
                        warn!("Failed to send {} alert for monitor {}: {}", channel_type, context.monitor_id, e);
                        ChannelOutcome {
                            channel_id: *channel_id,
                            channel_type,
                            delivery: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
        });

        let summary = DispatchSummary { outcomes: join_all(deliveries).await, throttled: false };

        if context.is_down_alert() && summary.successes() > 0 {
            self.throttle.record_alert(monitor_id);
        }

        info!(
            "Alert sent for monitor {}: {} successful, {} failed",
            monitor_id,
            summary.successes(),
            summary.failures()
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{HttpProbeConfig, Monitor, MonitorConfig, Owner};
    use crate::monitoring::types::CheckStatus;
    use crate::test_support::{RecordingSender, create_test_database, execute_script};
    use uuid::Uuid;

    async fn saved_monitor(db: &Arc<crate::database::DatabaseImpl>) -> Monitor {
        let monitor =
            Monitor::new(Uuid::new_v4(), "api", MonitorConfig::Http(HttpProbeConfig::new("https://api.example.com")));
        db.save_monitor(&monitor).await.unwrap();
        monitor
    }

    fn down(monitor: &Monitor) -> AlertContext {
        AlertContext::for_monitor(monitor, CheckStatus::Down, Some(CheckStatus::Up)).with_error(Some("boom".into()))
    }

    fn recovery(monitor: &Monitor) -> AlertContext {
        AlertContext::for_monitor(monitor, CheckStatus::Up, Some(CheckStatus::Down))
    }

    #[tokio::test]
    async fn test_no_channels_and_no_owner_chat_is_noop() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = saved_monitor(&db).await;
        let sender = RecordingSender::new();
        let dispatcher = AlertDispatcher::new(db, Arc::new(AlertThrottle::default()))
            .with_sender(ChannelType::Telegram, sender.clone());

        let summary = dispatcher.dispatch(&down(&monitor)).await.unwrap();
        assert!(summary.is_noop());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_down_alerts_are_throttled_but_recovery_is_not() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = saved_monitor(&db).await;
        db.save_alert_channel(monitor.id, &ChannelConfig::Telegram { chat_id: "42".into(), bot_token: None }, true)
            .await
            .unwrap();

        let sender = RecordingSender::new();
        let throttle = Arc::new(AlertThrottle::default());
        let dispatcher = AlertDispatcher::new(db, throttle.clone()).with_sender(ChannelType::Telegram, sender.clone());

        let first = dispatcher.dispatch(&down(&monitor)).await.unwrap();
        assert_eq!(first.successes(), 1);
        assert_eq!(throttle.record(monitor.id).unwrap().alert_count, 1);

        let recovered = dispatcher.dispatch(&recovery(&monitor)).await.unwrap();
        assert_eq!(recovered.successes(), 1);
        assert!(!recovered.throttled);

        let second = dispatcher.dispatch(&down(&monitor)).await.unwrap();
        assert!(second.throttled);
        assert!(second.outcomes.is_empty());

        let sent = sender.contexts();
        assert_eq!(sent.len(), 2);
        assert!(!sent[0].is_recovery());
        assert!(sent[1].is_recovery());
    }

    #[tokio::test]
    async fn test_falls_back_to_owner_chat_without_telegram_channel() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = saved_monitor(&db).await;
        db.save_owner(&Owner { id: monitor.owner_id, telegram_chat_id: Some("777".into()) }).await.unwrap();
        db.save_alert_channel(monitor.id, &ChannelConfig::Discord { webhook_url: "https://discord".into() }, true)
            .await
            .unwrap();

        let sender = RecordingSender::new();
        let dispatcher = AlertDispatcher::new(db, Arc::new(AlertThrottle::default()))
            .with_sender(ChannelType::Telegram, sender.clone());

        let summary = dispatcher.dispatch(&down(&monitor)).await.unwrap();
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.successes(), 1);

        let discord = summary.outcomes.iter().find(|o| o.channel_type == ChannelType::Discord).unwrap();
        assert_eq!(discord.delivery, Some(Delivery::Skipped));

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelConfig::Telegram { chat_id: "777".into(), bot_token: None });
    }

    #[tokio::test]
    async fn test_owner_chat_not_used_when_telegram_channel_exists() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = saved_monitor(&db).await;
        db.save_owner(&Owner { id: monitor.owner_id, telegram_chat_id: Some("777".into()) }).await.unwrap();
        db.save_alert_channel(monitor.id, &ChannelConfig::Telegram { chat_id: "42".into(), bot_token: None }, true)
            .await
            .unwrap();

        let sender = RecordingSender::new();
        let dispatcher = AlertDispatcher::new(db, Arc::new(AlertThrottle::default()))
            .with_sender(ChannelType::Telegram, sender.clone());

        dispatcher.dispatch(&down(&monitor)).await.unwrap();
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelConfig::Telegram { chat_id: "42".into(), bot_token: None });
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_do_not_arm_throttle() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = saved_monitor(&db).await;
        db.save_alert_channel(monitor.id, &ChannelConfig::Telegram { chat_id: "1".into(), bot_token: None }, true)
            .await
            .unwrap();
        db.save_alert_channel(monitor.id, &ChannelConfig::Slack { webhook_url: "https://slack".into() }, true)
            .await
            .unwrap();
        db.save_alert_channel(monitor.id, &ChannelConfig::Telegram { chat_id: "2".into(), bot_token: None }, false)
            .await
            .unwrap();

        let throttle = Arc::new(AlertThrottle::default());
        let dispatcher =
            AlertDispatcher::new(db, throttle.clone()).with_sender(ChannelType::Telegram, RecordingSender::failing());

        let summary = dispatcher.dispatch(&down(&monitor)).await.unwrap();
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.successes(), 0);
        assert!(summary.outcomes[0].error.as_deref().unwrap().contains("chat not found"));
        assert!(throttle.is_empty());
    }

    #[tokio::test]
    async fn test_owner_lookup_skipped_when_telegram_channel_exists() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = saved_monitor(&db).await;
        db.save_alert_channel(monitor.id, &ChannelConfig::Telegram { chat_id: "42".into(), bot_token: None }, true)
            .await
            .unwrap();
        execute_script(&db, "DROP TABLE owners").await.unwrap();

        let sender = RecordingSender::new();
        let dispatcher = AlertDispatcher::new(db, Arc::new(AlertThrottle::default()))
            .with_sender(ChannelType::Telegram, sender.clone());

        let summary = dispatcher.dispatch(&down(&monitor)).await.unwrap();
        assert_eq!(summary.successes(), 1);
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_lookup_failure_degrades_or_propagates() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = saved_monitor(&db).await;
        execute_script(&db, "DROP TABLE owners").await.unwrap();

        let sender = RecordingSender::new();
        let dispatcher = AlertDispatcher::new(db.clone(), Arc::new(AlertThrottle::default()))
            .with_sender(ChannelType::Telegram, sender.clone());

        // Nothing else to deliver to, so the lookup error surfaces.
        assert!(dispatcher.dispatch(&down(&monitor)).await.is_err());

        db.save_alert_channel(monitor.id, &ChannelConfig::Slack { webhook_url: "https://slack".into() }, true)
            .await
            .unwrap();
        let summary = dispatcher.dispatch(&down(&monitor)).await.unwrap();
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcomes[0].channel_type, ChannelType::Slack);
        assert!(sender.sent().is_empty());
    }
}
