//! Supervised services and logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Process supervisor (systemd) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Talk to the user manager (`systemctl --user`).
    #[serde(default)]
    pub user_mode: bool,

    /// Path or name of the `systemctl` binary.
    #[serde(default = "default_systemctl")]
    pub systemctl: String,

    /// Timeout for a single `systemctl` call.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Delay before re-checking a unit after restarting it.
    #[serde(default = "default_restart_settle")]
    pub restart_settle_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            user_mode: false,
            systemctl: default_systemctl(),
            command_timeout_secs: default_command_timeout(),
            restart_settle_secs: default_restart_settle(),
        }
    }
}

fn default_systemctl() -> String {
    "systemctl".to_string()
}

fn default_command_timeout() -> u64 {
    30
}

fn default_restart_settle() -> u64 {
    5
}

/// A monitored service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Unit name as known to the supervisor.
    pub name: String,

    /// Optional HTTP endpoint that must answer 2xx for the service to count as up.
    #[serde(default)]
    pub health_url: Option<String>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health_url: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory holding the daily log files.
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,

    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/watchkeeper")
}

fn default_log_level() -> String {
    "info".to_string()
}
