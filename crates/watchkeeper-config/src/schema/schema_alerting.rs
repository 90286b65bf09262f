//! Alerting configuration types (dedup store, retention, notification gateway).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Alert deduplication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Minimum interval between two notifications for the same alert key.
    #[serde(default = "default_window")]
    pub window_secs: u64,

    /// Location of the persisted alert records.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// How long to wait for a concurrent invocation to release the store.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window(),
            store_path: default_store_path(),
            lock_timeout_secs: default_lock_timeout(),
        }
    }
}

fn default_window() -> u64 {
    3600
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/var/lib/watchkeeper/alerts.json")
}

fn default_lock_timeout() -> u64 {
    10
}

/// Retention periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Log files older than this are deleted.
    #[serde(default = "default_log_days")]
    pub log_days: u64,

    /// Alert records not refreshed for this long are pruned.
    #[serde(default = "default_record_days")]
    pub record_days: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            log_days: default_log_days(),
            record_days: default_record_days(),
        }
    }
}

fn default_log_days() -> u64 {
    7
}

fn default_record_days() -> u64 {
    30
}

/// Notification gateway endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL; alerts are posted to `{url}/alert`.
    pub url: String,

    /// Bearer token, usually `${ENV_VAR}`.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// File holding the bearer token. Used when `token` is not set.
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Resolve the bearer token from the inline value or the token file.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        if let Some(ref token) = self.token {
            return Ok(token.trim().to_string());
        }

        match self.token_file {
            Some(ref path) => read_token_file(path),
            None => Err(ConfigError::MissingField(
                "gateway.token or gateway.token_file".to_string(),
            )),
        }
    }
}

fn read_token_file(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TokenFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let token = content.trim();
    if token.is_empty() {
        return Err(ConfigError::TokenFile {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(token.to_string())
}

fn default_gateway_timeout() -> u64 {
    10
}
