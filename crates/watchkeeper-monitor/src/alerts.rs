//! Alert types and core trait definitions.

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use watchkeeper_supervisor::RestartAttempt;

use crate::error::MonitorError;
use crate::evaluator::{BreachEvent, BreachKind};

/// Alert severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
    /// Critical.
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "INFO"),
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Error => write!(f, "ERROR"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// An alert message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Alert title.
    pub title: String,
    /// Alert message.
    pub message: String,
    /// Severity level.
    pub severity: AlertSeverity,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Host the alert is about.
    pub source: Option<String>,
}

impl Alert {
    /// Create a new alert.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: AlertSeverity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            timestamp,
            source: None,
        }
    }

    /// Set source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Build the notification for a breach. Service failures list every
    /// affected service together with what the restart attempt did.
    pub fn from_breach(
        breach: &BreachEvent,
        restarts: &[RestartAttempt],
        timestamp: DateTime<Utc>,
    ) -> Self {
        match &breach.kind {
            BreachKind::Metric {
                metric,
                value,
                limit,
            } => Alert::new(
                metric.title(),
                metric.describe_breach(*value, *limit),
                AlertSeverity::Warning,
                timestamp,
            ),
            BreachKind::ServicesDown { services } => {
                let mut message = String::from("The following services are not running:\n");
                let mut any_failed = false;
                for status in services {
                    let detail = status.detail.as_deref().unwrap_or("inactive");
                    let outcome = match restarts.iter().find(|r| r.service == status.name) {
                        Some(r) if r.success => "restarted".to_string(),
                        Some(r) => {
                            any_failed = true;
                            format!(
                                "restart failed: {}",
                                r.error.as_deref().unwrap_or("unknown error")
                            )
                        }
                        None => "no restart attempted".to_string(),
                    };
                    message.push_str(&format!("- {} ({}): {}\n", status.name, detail, outcome));
                }
                let severity = if any_failed {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Error
                };
                Alert::new(breach.title(), message.trim_end(), severity, timestamp)
            }
        }
    }
}

/// Alert channel trait.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Channel name.
    fn name(&self) -> &str;

    /// Send an alert.
    async fn send(&self, alert: &Alert) -> Result<(), MonitorError>;
}

/// Log channel (writes to tracing). Used for dry runs and when no gateway is configured.
pub struct LogChannel;

#[async_trait]
impl AlertChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        match alert.severity {
            AlertSeverity::Info => info!("[ALERT] {}: {}", alert.title, alert.message),
            AlertSeverity::Warning => warn!("[ALERT] {}: {}", alert.title, alert.message),
            AlertSeverity::Error | AlertSeverity::Critical => {
                error!("[ALERT] {}: {}", alert.title, alert.message)
            }
        }
        Ok(())
    }
}
