//! Retention: old log files and expired alert records.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};
use watchkeeper_config::Config;
use watchkeeper_store::{AlertKey, Deduplicator};

use crate::error::MonitorError;

/// File name prefix of the agent's rotated log files.
pub const LOG_FILE_PREFIX: &str = "watchkeeper";

const DAY: u64 = 86_400;

/// What a retention pass removed.
#[derive(Debug, Default, Serialize)]
pub struct RetentionReport {
    pub logs_removed: Vec<PathBuf>,
    pub records_removed: Vec<AlertKey>,
}

/// Deletes log files and alert records past their retention period.
pub struct RetentionManager {
    log_dir: PathBuf,
    log_max_age: Duration,
    record_max_age: Duration,
}

impl RetentionManager {
    pub fn new(log_dir: impl Into<PathBuf>, log_max_age: Duration, record_max_age: Duration) -> Self {
        Self {
            log_dir: log_dir.into(),
            log_max_age,
            record_max_age,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.logging.directory,
            Duration::from_secs(config.retention.log_days.saturating_mul(DAY)),
            Duration::from_secs(config.retention.record_days.saturating_mul(DAY)),
        )
    }

    /// Run both passes. Errors are logged; a pass that fails removes nothing more.
    pub async fn run(&self, dedup: Option<&Deduplicator>, now: DateTime<Utc>) -> RetentionReport {
        let mut report = RetentionReport::default();

        match self.prune_logs(now.into()).await {
            Ok(removed) => report.logs_removed = removed,
            Err(e) => error!("Log retention failed: {}", e),
        }

        match dedup {
            Some(dedup) => match dedup.prune(now, self.record_max_age).await {
                Ok(removed) => report.records_removed = removed,
                Err(e) => error!("Alert record retention failed: {}", e),
            },
            None => debug!("No alert store this run, skipping record retention"),
        }

        if !report.logs_removed.is_empty() || !report.records_removed.is_empty() {
            info!(
                "Retention removed {} log file(s) and {} alert record(s)",
                report.logs_removed.len(),
                report.records_removed.len()
            );
        }
        report
    }

    /// Delete `watchkeeper*` files in the log directory last modified before
    /// `now - log_max_age`. A missing directory is already clean.
    pub async fn prune_logs(&self, now: SystemTime) -> Result<Vec<PathBuf>, MonitorError> {
        let cutoff = now.checked_sub(self.log_max_age).unwrap_or(SystemTime::UNIX_EPOCH);

        let mut entries = match tokio::fs::read_dir(&self.log_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_log_file(&path) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !modified_before(&path, metadata.modified(), cutoff) {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Removed old log file {}", path.display());
                    removed.push(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => error!("Failed to remove {}: {}", path.display(), e),
            }
        }
        removed.sort();
        Ok(removed)
    }
}

/// A file whose mtime cannot be read is kept.
fn modified_before(path: &Path, modified: std::io::Result<SystemTime>, cutoff: SystemTime) -> bool {
    match modified {
        Ok(modified) => modified < cutoff,
        Err(e) => {
            debug!("Skipping {}: no modification time: {}", path.display(), e);
            false
        }
    }
}

fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
}
