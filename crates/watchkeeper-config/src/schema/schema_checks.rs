//! Threshold and check configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::default_true;

/// Static threshold table. Every limit is compared with "greater-than".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// CPU usage percent.
    #[serde(default = "default_cpu_limit")]
    pub cpu_usage: f64,

    /// Memory usage percent.
    #[serde(default = "default_memory_limit")]
    pub memory_usage: f64,

    /// Disk usage percent for the monitored mount.
    #[serde(default = "default_disk_limit")]
    pub disk_usage: f64,

    /// Hottest sensor, degrees Celsius.
    #[serde(default = "default_temperature_limit")]
    pub temperature: f64,

    /// Percent of network targets that failed to connect.
    #[serde(default)]
    pub network_unreachable: f64,

    /// 0 when the data store passes its integrity check, 1 otherwise.
    #[serde(default)]
    pub datastore_integrity: f64,
}

impl ThresholdsConfig {
    /// All limits keyed by metric name.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("cpu_usage", self.cpu_usage),
            ("memory_usage", self.memory_usage),
            ("disk_usage", self.disk_usage),
            ("temperature", self.temperature),
            ("network_unreachable", self.network_unreachable),
            ("datastore_integrity", self.datastore_integrity),
        ]
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cpu_usage: default_cpu_limit(),
            memory_usage: default_memory_limit(),
            disk_usage: default_disk_limit(),
            temperature: default_temperature_limit(),
            network_unreachable: 0.0,
            datastore_integrity: 0.0,
        }
    }
}

fn default_cpu_limit() -> f64 {
    90.0
}

fn default_memory_limit() -> f64 {
    90.0
}

fn default_disk_limit() -> f64 {
    90.0
}

fn default_temperature_limit() -> f64 {
    75.0
}

/// Which checks the sampler runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    #[serde(default = "default_true")]
    pub cpu: bool,

    #[serde(default = "default_true")]
    pub memory: bool,

    #[serde(default = "default_true")]
    pub disk: bool,

    /// Mount point whose usage is reported.
    #[serde(default = "default_disk_mount")]
    pub disk_mount: PathBuf,

    #[serde(default = "default_true")]
    pub temperature: bool,

    /// `host:port` pairs probed with a TCP connect.
    #[serde(default = "default_network_targets")]
    pub network_targets: Vec<String>,

    /// SQLite file checked with `PRAGMA quick_check`.
    #[serde(default)]
    pub datastore_path: Option<PathBuf>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            cpu: default_true(),
            memory: default_true(),
            disk: default_true(),
            disk_mount: default_disk_mount(),
            temperature: default_true(),
            network_targets: default_network_targets(),
            datastore_path: None,
        }
    }
}

fn default_disk_mount() -> PathBuf {
    PathBuf::from("/")
}

fn default_network_targets() -> Vec<String> {
    vec!["1.1.1.1:53".to_string(), "8.8.8.8:53".to_string()]
}
