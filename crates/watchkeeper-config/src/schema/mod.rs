//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_alerting;
mod schema_checks;
mod schema_services;

pub use schema_alerting::*;
pub use schema_checks::*;
pub use schema_services::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    #[serde(default)]
    pub checks: ChecksConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    /// Notification gateway. Alerts are only logged when absent.
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,

    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub services: Vec<ServiceConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Expand `~` in every path-valued setting.
    pub fn expand_paths(&mut self) {
        self.checks.disk_mount = expand(&self.checks.disk_mount);
        if let Some(ref path) = self.checks.datastore_path {
            self.checks.datastore_path = Some(expand(path));
        }
        self.dedup.store_path = expand(&self.dedup.store_path);
        self.logging.directory = expand(&self.logging.directory);
        if let Some(ref mut gateway) = self.gateway {
            if let Some(ref path) = gateway.token_file {
                gateway.token_file = Some(expand(path));
            }
        }
    }
}

fn expand(path: &std::path::Path) -> std::path::PathBuf {
    crate::ConfigLoader::expand_path(&path.to_string_lossy()).into()
}

/// Invocation-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard deadline for one invocation.
    #[serde(default = "default_max_runtime")]
    pub max_runtime_secs: u64,

    /// Timeout applied to each individual check.
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_runtime_secs: default_max_runtime(),
            check_timeout_secs: default_check_timeout(),
        }
    }
}

fn default_max_runtime() -> u64 {
    120
}

fn default_check_timeout() -> u64 {
    5
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
