//! Alert record storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::lock::StoreLock;
use crate::record::{AlertKey, AlertRecord};

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// Alert record storage trait.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Get the record for a key.
    async fn get(&self, key: &AlertKey) -> Result<Option<AlertRecord>, StoreError>;

    /// Create or overwrite a record.
    async fn put(&self, record: AlertRecord) -> Result<(), StoreError>;

    /// List all records ordered by key.
    async fn list(&self) -> Result<Vec<AlertRecord>, StoreError>;

    /// Delete every record last sent before `cutoff` or after `now`.
    /// Returns the removed keys.
    async fn remove_expired(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertKey>, StoreError>;
}

fn split_expired(
    records: &mut BTreeMap<AlertKey, i64>,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<AlertKey> {
    let (cutoff, now) = (cutoff.timestamp(), now.timestamp());
    let expired: Vec<AlertKey> = records
        .iter()
        .filter(|(_, last_sent)| **last_sent < cutoff || **last_sent > now)
        .map(|(key, _)| key.clone())
        .collect();
    for key in &expired {
        records.remove(key);
    }
    expired
}

fn to_records(records: &BTreeMap<AlertKey, i64>) -> Vec<AlertRecord> {
    records
        .iter()
        .map(|(key, last_sent)| AlertRecord {
            key: key.clone(),
            last_sent: *last_sent,
        })
        .collect()
}

/// In-memory alert store for testing.
pub struct MemoryAlertStore {
    records: RwLock<BTreeMap<AlertKey, i64>>,
}

impl MemoryAlertStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryAlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn get(&self, key: &AlertKey) -> Result<Option<AlertRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(key).map(|last_sent| AlertRecord {
            key: key.clone(),
            last_sent: *last_sent,
        }))
    }

    async fn put(&self, record: AlertRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(record.key, record.last_sent);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AlertRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(to_records(&records))
    }

    async fn remove_expired(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertKey>, StoreError> {
        let mut records = self.records.write().await;
        Ok(split_expired(&mut records, cutoff, now))
    }
}

/// On-disk representation.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: BTreeMap<AlertKey, i64>,
}

/// JSON file backed alert store.
///
/// The whole map lives in one file that is replaced atomically on every
/// change:
/// ```text
/// {dir}/
/// ├── alerts.json        {"version": 1, "records": {"high_cpu": 1700000000}}
/// └── alerts.json.lock   held exclusively while the store is open
/// ```
pub struct FileAlertStore {
    path: PathBuf,
    records: Mutex<BTreeMap<AlertKey, i64>>,
    _lock: StoreLock,
}

impl FileAlertStore {
    /// Open the store, waiting up to `lock_timeout` for a concurrent holder.
    ///
    /// A missing file loads as empty. A corrupt or unreadable file is logged
    /// and also loads as empty; it is overwritten by the next successful write.
    pub async fn open(path: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.into();
        let lock = StoreLock::acquire(StoreLock::path_for(&path), lock_timeout).await?;

        let records = match Self::load(&path).await {
            Ok(records) => records,
            Err(e) => {
                error!("Alert store unusable, starting empty: {}", e);
                BTreeMap::new()
            }
        };

        debug!(
            "FileAlertStore opened at {:?} with {} record(s)",
            path,
            records.len()
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
            _lock: lock,
        })
    }

    /// Get the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> Result<BTreeMap<AlertKey, i64>, StoreError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No alert store at {:?}, starting fresh", path);
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        let file: StoreFile = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if file.version != FORMAT_VERSION {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: format!("unsupported format version {}", file.version),
            });
        }

        Ok(file.records)
    }

    /// Replace the store file atomically: write a sibling temp file, fsync it,
    /// then rename it over the target.
    async fn persist(&self, records: &BTreeMap<AlertKey, i64>) -> Result<(), StoreError> {
        let file = StoreFile {
            version: FORMAT_VERSION,
            records: records.clone(),
        };
        let content = serde_json::to_vec_pretty(&file).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize alert store: {}", e))
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "alerts.json".to_string());
        let tmp_path = dir.join(format!(".{}.tmp-{}", file_name, std::process::id()));

        let write_result = async {
            let mut tmp = fs::File::create(&tmp_path).await?;
            tmp.write_all(&content).await?;
            tmp.sync_all().await?;
            drop(tmp);
            fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = write_result {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove temp file {:?}: {}", tmp_path, cleanup);
                }
            }
            return Err(e.into());
        }

        // Make the rename itself durable.
        #[cfg(unix)]
        if let Ok(dir_handle) = fs::File::open(&dir).await {
            if let Err(e) = dir_handle.sync_all().await {
                debug!("Failed to fsync {:?}: {}", dir, e);
            }
        }

        debug!("Persisted {} alert record(s) to {:?}", records.len(), self.path);
        Ok(())
    }
}

#[async_trait]
impl AlertStore for FileAlertStore {
    async fn get(&self, key: &AlertKey) -> Result<Option<AlertRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.get(key).map(|last_sent| AlertRecord {
            key: key.clone(),
            last_sent: *last_sent,
        }))
    }

    async fn put(&self, record: AlertRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let mut updated = records.clone();
        updated.insert(record.key, record.last_sent);

        // Memory only changes once the file write succeeded.
        self.persist(&updated).await?;
        *records = updated;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AlertRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(to_records(&records))
    }

    async fn remove_expired(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertKey>, StoreError> {
        let mut records = self.records.lock().await;
        let mut updated = records.clone();
        let expired = split_expired(&mut updated, cutoff, now);

        if !expired.is_empty() {
            self.persist(&updated).await?;
            *records = updated;
        }
        Ok(expired)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
