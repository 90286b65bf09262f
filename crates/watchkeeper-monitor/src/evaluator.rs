//! Threshold evaluation.

use std::collections::BTreeMap;

use serde::Serialize;
use watchkeeper_config::ThresholdsConfig;
use watchkeeper_store::AlertKey;
use watchkeeper_supervisor::ServiceStatus;

use crate::sample::{Metric, SampleSet};

/// Greater-than limits per metric.
#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    limits: BTreeMap<Metric, f64>,
}

impl ThresholdTable {
    pub fn new(limits: impl IntoIterator<Item = (Metric, f64)>) -> Self {
        Self {
            limits: limits.into_iter().collect(),
        }
    }

    pub fn from_config(config: &ThresholdsConfig) -> Self {
        Self::new(
            config
                .entries()
                .into_iter()
                .filter_map(|(name, limit)| Metric::from_name(name).map(|m| (m, limit))),
        )
    }

    pub fn limit(&self, metric: Metric) -> Option<f64> {
        self.limits.get(&metric).copied()
    }
}

/// What breached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreachKind {
    /// A sample exceeded its limit.
    Metric { metric: Metric, value: f64, limit: f64 },
    /// One or more services are down.
    ServicesDown { services: Vec<ServiceStatus> },
}

/// A detected breach, keyed by its alert class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreachEvent {
    pub key: AlertKey,
    #[serde(flatten)]
    pub kind: BreachKind,
}

impl BreachEvent {
    pub fn title(&self) -> &'static str {
        match &self.kind {
            BreachKind::Metric { metric, .. } => metric.title(),
            BreachKind::ServicesDown { .. } => "Service Failure",
        }
    }

    pub fn is_service_failure(&self) -> bool {
        matches!(self.kind, BreachKind::ServicesDown { .. })
    }
}

/// Compares samples against the threshold table.
pub struct Evaluator {
    thresholds: ThresholdTable,
}

impl Evaluator {
    pub fn new(thresholds: ThresholdTable) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Metric breaches followed by at most one aggregated service failure.
    pub fn evaluate(&self, set: &SampleSet) -> Vec<BreachEvent> {
        let mut breaches = self.metric_breaches(set);
        breaches.extend(self.service_failure(set));
        breaches
    }

    /// One event per sample strictly above its limit. Samples without a limit are ignored.
    pub fn metric_breaches(&self, set: &SampleSet) -> Vec<BreachEvent> {
        set.samples
            .iter()
            .filter_map(|sample| {
                let limit = self.thresholds.limit(sample.metric)?;
                (sample.value > limit).then(|| BreachEvent {
                    key: sample.metric.alert_key(),
                    kind: BreachKind::Metric {
                        metric: sample.metric,
                        value: sample.value,
                        limit,
                    },
                })
            })
            .collect()
    }

    /// A single `service_failure` event listing every inactive service, if any.
    pub fn service_failure(&self, set: &SampleSet) -> Option<BreachEvent> {
        let services: Vec<ServiceStatus> = set.inactive_services().cloned().collect();
        if services.is_empty() {
            return None;
        }
        Some(BreachEvent {
            key: AlertKey::service_failure(),
            kind: BreachKind::ServicesDown { services },
        })
    }
}
