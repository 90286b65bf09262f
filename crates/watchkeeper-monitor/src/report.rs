//! Health summary for `check` output and the on-demand report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use watchkeeper_supervisor::ServiceStatus;

use crate::alerts::{Alert, AlertSeverity};
use crate::evaluator::{BreachEvent, ThresholdTable};
use crate::sample::{Metric, SampleSet, Unavailable};

/// One metric line of the report.
#[derive(Debug, Clone, Serialize)]
pub struct MetricReading {
    pub metric: Metric,
    pub value: f64,
    pub limit: Option<f64>,
    pub breached: bool,
}

/// Point-in-time health of the host and its services.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub metrics: Vec<MetricReading>,
    pub services: Vec<ServiceStatus>,
    pub unavailable: Vec<Unavailable>,
    pub breaches: Vec<BreachEvent>,
}

impl HealthReport {
    pub fn new(set: &SampleSet, thresholds: &ThresholdTable, breaches: Vec<BreachEvent>) -> Self {
        let metrics = set
            .samples
            .iter()
            .map(|s| {
                let limit = thresholds.limit(s.metric);
                MetricReading {
                    metric: s.metric,
                    value: s.value,
                    limit,
                    breached: limit.is_some_and(|l| s.value > l),
                }
            })
            .collect();

        Self {
            generated_at: set.timestamp,
            metrics,
            services: set.services.clone(),
            unavailable: set.unavailable.clone(),
            breaches,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.breaches.is_empty()
    }

    pub fn format_text(&self) -> String {
        let mut out = String::from("Metrics:\n");
        for m in &self.metrics {
            let marker = if m.breached { "!!" } else { "ok" };
            let limit = m
                .limit
                .map(|l| format!(" (limit {})", m.metric.format_value(l)))
                .unwrap_or_default();
            out.push_str(&format!(
                "  [{}] {}: {}{}\n",
                marker,
                m.metric,
                m.metric.format_value(m.value),
                limit
            ));
        }

        if !self.services.is_empty() {
            out.push_str("Services:\n");
            for s in &self.services {
                let state = if s.is_active {
                    "active".to_string()
                } else {
                    format!("DOWN ({})", s.detail.as_deref().unwrap_or("inactive"))
                };
                out.push_str(&format!("  {}: {}\n", s.name, state));
            }
        }

        if !self.unavailable.is_empty() {
            out.push_str("Unavailable:\n");
            for u in &self.unavailable {
                out.push_str(&format!("  {}: {}\n", u.check, u.reason));
            }
        }

        out.trim_end().to_string()
    }

    /// The report as a notification.
    pub fn to_alert(&self) -> Alert {
        let severity = if self.is_healthy() {
            AlertSeverity::Info
        } else {
            AlertSeverity::Warning
        };
        Alert::new(
            format!("Health Report - {}", self.generated_at.format("%Y-%m-%d")),
            self.format_text(),
            severity,
            self.generated_at,
        )
    }
}
