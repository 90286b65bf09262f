//! Metric samples and the per-invocation sample set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watchkeeper_store::AlertKey;
use watchkeeper_supervisor::ServiceStatus;

/// A sampled metric. Each maps to exactly one alert class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CpuUsage,
    MemoryUsage,
    DiskUsage,
    Temperature,
    NetworkUnreachable,
    DatastoreIntegrity,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::CpuUsage,
        Metric::MemoryUsage,
        Metric::DiskUsage,
        Metric::Temperature,
        Metric::NetworkUnreachable,
        Metric::DatastoreIntegrity,
    ];

    /// Metric name as used in the `[thresholds]` table.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::CpuUsage => "cpu_usage",
            Metric::MemoryUsage => "memory_usage",
            Metric::DiskUsage => "disk_usage",
            Metric::Temperature => "temperature",
            Metric::NetworkUnreachable => "network_unreachable",
            Metric::DatastoreIntegrity => "datastore_integrity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Alert class raised when this metric breaches.
    pub fn alert_key(&self) -> AlertKey {
        AlertKey::new(match self {
            Metric::CpuUsage => "high_cpu",
            Metric::MemoryUsage => "high_memory",
            Metric::DiskUsage => "high_disk",
            Metric::Temperature => "high_temperature",
            Metric::NetworkUnreachable => "network_unreachable",
            Metric::DatastoreIntegrity => "datastore_corrupt",
        })
    }

    /// Notification title.
    pub fn title(&self) -> &'static str {
        match self {
            Metric::CpuUsage => "High CPU Usage",
            Metric::MemoryUsage => "High Memory Usage",
            Metric::DiskUsage => "High Disk Usage",
            Metric::Temperature => "High Temperature",
            Metric::NetworkUnreachable => "Network Unreachable",
            Metric::DatastoreIntegrity => "Data Store Integrity Failure",
        }
    }

    /// Human-readable rendering of a value of this metric.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Metric::CpuUsage | Metric::MemoryUsage | Metric::DiskUsage => {
                format!("{:.1}%", value)
            }
            Metric::Temperature => format!("{:.1}\u{b0}C", value),
            Metric::NetworkUnreachable => format!("{:.0}% of targets unreachable", value),
            Metric::DatastoreIntegrity => {
                if value > 0.0 {
                    "integrity errors".to_string()
                } else {
                    "ok".to_string()
                }
            }
        }
    }
}

impl Metric {
    /// Notification body for a breach of this metric.
    pub fn describe_breach(&self, value: f64, limit: f64) -> String {
        let label = match self {
            Metric::CpuUsage => "CPU usage",
            Metric::MemoryUsage => "Memory usage",
            Metric::DiskUsage => "Disk usage",
            Metric::Temperature => "Temperature",
            Metric::NetworkUnreachable => {
                return format!(
                    "{:.0}% of network targets are unreachable (threshold {:.0}%)",
                    value, limit
                );
            }
            Metric::DatastoreIntegrity => {
                return "Data store integrity check reported errors".to_string();
            }
        };
        format!(
            "{} is {} (threshold {})",
            label,
            self.format_value(value),
            self.format_value(limit)
        )
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One reading of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub metric: Metric,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(metric: Metric, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            metric,
            value,
            timestamp,
        }
    }
}

/// A check that produced no reading this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unavailable {
    pub check: String,
    pub reason: String,
}

/// Everything the sampler observed in one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSet {
    pub timestamp: DateTime<Utc>,
    pub samples: Vec<MetricSample>,
    pub services: Vec<ServiceStatus>,
    pub unavailable: Vec<Unavailable>,
}

impl SampleSet {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            samples: Vec::new(),
            services: Vec::new(),
            unavailable: Vec::new(),
        }
    }

    pub fn push(&mut self, metric: Metric, value: f64) {
        self.samples
            .push(MetricSample::new(metric, value, self.timestamp));
    }

    pub fn mark_unavailable(&mut self, check: impl Into<String>, reason: impl Into<String>) {
        self.unavailable.push(Unavailable {
            check: check.into(),
            reason: reason.into(),
        });
    }

    /// Value of `metric`, if it was sampled.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.metric == metric)
            .map(|s| s.value)
    }

    pub fn inactive_services(&self) -> impl Iterator<Item = &ServiceStatus> {
        self.services.iter().filter(|s| !s.is_active)
    }
}
