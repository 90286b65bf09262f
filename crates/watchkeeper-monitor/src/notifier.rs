//! Notifier: dispatches alerts through a channel, gated by deduplication.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use watchkeeper_config::Config;
use watchkeeper_store::{AlertKey, Deduplicator};

use crate::alerts::{Alert, AlertChannel, LogChannel};
use crate::gateway::GatewayChannel;

/// What happened to one alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Delivered.
    Sent,
    /// Within the dedup window of an earlier send.
    Suppressed,
    /// Delivery failed; nothing recorded, the next run retries.
    Failed,
    /// No alert store this run, so nothing was dispatched.
    Skipped,
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchOutcome::Sent => write!(f, "sent"),
            DispatchOutcome::Suppressed => write!(f, "suppressed"),
            DispatchOutcome::Failed => write!(f, "failed"),
            DispatchOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Notifier.
pub struct Notifier {
    channel: Box<dyn AlertChannel>,
    dedup: Option<Deduplicator>,
    record: bool,
    source: Option<String>,
}

impl Notifier {
    /// Create a notifier. Without a deduplicator, deduplicated dispatch is skipped.
    pub fn new(channel: Box<dyn AlertChannel>, dedup: Option<Deduplicator>) -> Self {
        Self {
            channel,
            dedup,
            record: true,
            source: None,
        }
    }

    /// Check dedup state but never record sends.
    pub fn without_recording(mut self) -> Self {
        self.record = false;
        self
    }

    /// Tag every alert with the host it is about.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Channel for this invocation: the gateway when configured, otherwise the log.
    pub fn channel_from_config(config: &Config, dry_run: bool) -> Box<dyn AlertChannel> {
        if dry_run {
            info!("Dry run: alerts are logged, not sent");
            return Box::new(LogChannel);
        }

        match config.gateway {
            Some(ref gateway) => match GatewayChannel::from_config(gateway) {
                Ok(channel) => {
                    debug!("Alerts go to {}", channel.endpoint());
                    Box::new(channel)
                }
                Err(e) => {
                    error!("Gateway unusable, alerts will only be logged: {}", e);
                    Box::new(LogChannel)
                }
            },
            None => {
                warn!("No gateway configured, alerts will only be logged");
                Box::new(LogChannel)
            }
        }
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    pub fn deduplicator(&self) -> Option<&Deduplicator> {
        self.dedup.as_ref()
    }

    /// Send without deduplication. Failures are logged and reported as `false`.
    pub async fn send(&self, alert: &Alert) -> bool {
        let alert = match self.source {
            Some(ref source) if alert.source.is_none() => alert.clone().with_source(source),
            _ => alert.clone(),
        };

        match self.channel.send(&alert).await {
            Ok(()) => {
                info!("Alert '{}' sent via {}", alert.title, self.channel.name());
                true
            }
            Err(e) => {
                error!(
                    "Failed to send alert '{}' via {}: {}",
                    alert.title,
                    self.channel.name(),
                    e
                );
                false
            }
        }
    }

    /// Send `alert` under `key` unless it was sent within the dedup window.
    /// Only a successful send is recorded.
    pub async fn dispatch(&self, key: &AlertKey, alert: &Alert, now: DateTime<Utc>) -> DispatchOutcome {
        let Some(ref dedup) = self.dedup else {
            warn!("Alert store unavailable, not dispatching '{}': {}", key, alert.message);
            return DispatchOutcome::Skipped;
        };

        if !dedup.should_send(key, now).await {
            info!("Alert '{}' suppressed", key);
            return DispatchOutcome::Suppressed;
        }

        if !self.send(alert).await {
            return DispatchOutcome::Failed;
        }

        if self.record {
            if let Err(e) = dedup.mark_sent(key, now).await {
                error!("Alert '{}' sent but not recorded: {}", key, e);
            }
        }
        DispatchOutcome::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertSeverity;
    use crate::testing::RecordingChannel;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use watchkeeper_store::{AlertStore, MemoryAlertStore};

    const HOUR: std::time::Duration = std::time::Duration::from_secs(3600);

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn cpu_alert(value: f64) -> Alert {
        Alert::new(
            "High CPU Usage",
            format!("CPU usage is {:.1}% (threshold 90.0%)", value),
            AlertSeverity::Warning,
            t0(),
        )
    }

    fn notifier() -> (Notifier, RecordingChannel, Arc<MemoryAlertStore>) {
        let channel = RecordingChannel::default();
        let store = Arc::new(MemoryAlertStore::new());
        let dedup = Deduplicator::new(store.clone(), HOUR);
        (
            Notifier::new(Box::new(channel.clone()), Some(dedup)),
            channel,
            store,
        )
    }

    #[tokio::test]
    async fn test_dispatch_then_suppress_then_resend() {
        let (notifier, channel, _) = notifier();
        let key = AlertKey::new("high_cpu");

        assert_eq!(
            notifier.dispatch(&key, &cpu_alert(95.0), t0()).await,
            DispatchOutcome::Sent
        );
        assert_eq!(
            notifier
                .dispatch(&key, &cpu_alert(96.0), t0() + Duration::minutes(10))
                .await,
            DispatchOutcome::Suppressed
        );
        assert_eq!(
            notifier
                .dispatch(&key, &cpu_alert(96.0), t0() + Duration::minutes(65))
                .await,
            DispatchOutcome::Sent
        );
        assert_eq!(channel.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_is_not_recorded() {
        let (notifier, channel, store) = notifier();
        let key = AlertKey::new("high_cpu");

        channel.set_failing(true);
        assert_eq!(
            notifier.dispatch(&key, &cpu_alert(95.0), t0()).await,
            DispatchOutcome::Failed
        );
        assert!(store.get(&key).await.unwrap().is_none());

        channel.set_failing(false);
        assert_eq!(
            notifier
                .dispatch(&key, &cpu_alert(95.0), t0() + Duration::minutes(15))
                .await,
            DispatchOutcome::Sent
        );
        assert_eq!(channel.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_no_store_skips_dispatch() {
        let channel = RecordingChannel::default();
        let notifier = Notifier::new(Box::new(channel.clone()), None);

        let outcome = notifier
            .dispatch(&AlertKey::new("high_cpu"), &cpu_alert(95.0), t0())
            .await;
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_without_recording_leaves_store_untouched() {
        let (notifier, channel, store) = notifier();
        let notifier = notifier.without_recording();
        let key = AlertKey::new("high_cpu");

        notifier.dispatch(&key, &cpu_alert(95.0), t0()).await;
        notifier.dispatch(&key, &cpu_alert(95.0), t0()).await;
        assert_eq!(channel.sent().len(), 2);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_tags_source() {
        let (notifier, channel, _) = notifier();
        let notifier = notifier.with_source("pi-01");

        assert!(notifier.send(&cpu_alert(95.0)).await);
        assert_eq!(channel.sent()[0].source.as_deref(), Some("pi-01"));
    }

    #[test]
    fn test_channel_from_config() {
        let mut config = Config::default();
        assert_eq!(Notifier::channel_from_config(&config, false).name(), "log");

        config.gateway = Some(watchkeeper_config::GatewayConfig {
            url: "http://127.0.0.1:8001".to_string(),
            token: Some("abc".to_string()),
            token_file: None,
            timeout_secs: 10,
        });
        assert_eq!(Notifier::channel_from_config(&config, false).name(), "gateway");
        assert_eq!(Notifier::channel_from_config(&config, true).name(), "log");
    }
}
