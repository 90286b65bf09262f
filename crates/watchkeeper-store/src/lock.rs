//! Advisory lock serialising access to the alert store.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::StoreError;

const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Exclusive lock on a sibling `.lock` file. Released on drop.
pub struct StoreLock {
    path: PathBuf,
    #[cfg(unix)]
    _guard: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _guard: File,
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLock").field("path", &self.path).finish()
    }
}

impl StoreLock {
    /// Lock file path used for a given store file.
    pub fn path_for(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "alerts".into());
        name.push(".lock");
        store_path.with_file_name(name)
    }

    /// Get the lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the lock, retrying until `timeout` elapses. The open and
    /// flock calls run on the blocking pool.
    pub async fn acquire(path: impl Into<PathBuf>, timeout: Duration) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let started = Instant::now();
        let mut contended = false;

        loop {
            match Self::attempt(&path).await? {
                Some(lock) => {
                    if contended {
                        info!(
                            "Acquired store lock {} after {}ms",
                            path.display(),
                            started.elapsed().as_millis()
                        );
                    } else {
                        debug!("Acquired store lock {}", path.display());
                    }
                    return Ok(lock);
                }
                None => {
                    if !contended {
                        info!("Store lock {} is held, waiting", path.display());
                        contended = true;
                    }
                    if started.elapsed() >= timeout {
                        return Err(StoreError::LockTimeout {
                            path,
                            waited_ms: started.elapsed().as_millis(),
                        });
                    }
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
            }
        }
    }

    async fn attempt(path: &Path) -> Result<Option<Self>, StoreError> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = Self::open(&owned)?;
            Self::try_lock(file, &owned)
        })
        .await
        .map_err(|e| StoreError::Lock {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    }

    fn open(path: &Path) -> Result<File, StoreError> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| StoreError::Lock {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Returns `Ok(None)` when another holder owns the lock.
    #[cfg(unix)]
    fn try_lock(file: File, path: &Path) -> Result<Option<Self>, StoreError> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(guard) => Ok(Some(Self {
                path: path.to_path_buf(),
                _guard: guard,
            })),
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
            Err((_, errno)) => Err(StoreError::Lock {
                path: path.to_path_buf(),
                reason: errno.desc().to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn try_lock(file: File, path: &Path) -> Result<Option<Self>, StoreError> {
        Ok(Some(Self {
            path: path.to_path_buf(),
            _guard: file,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_for() {
        let path = StoreLock::path_for(Path::new("/var/lib/watchkeeper/alerts.json"));
        assert_eq!(path, PathBuf::from("/var/lib/watchkeeper/alerts.json.lock"));
    }

    #[tokio::test]
    async fn test_acquire_creates_lock_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("alerts.json.lock");

        let lock = StoreLock::acquire(&path, Duration::from_secs(1)).await.unwrap();
        assert!(path.exists());
        assert_eq!(lock.path(), path.as_path());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_second_acquire_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json.lock");

        let _held = StoreLock::acquire(&path, Duration::from_secs(1)).await.unwrap();
        let result = StoreLock::acquire(&path, Duration::from_millis(250)).await;
        assert!(matches!(result, Err(StoreError::LockTimeout { .. })));
    }

    #[tokio::test]
    async fn test_reacquire_after_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json.lock");

        let held = StoreLock::acquire(&path, Duration::from_secs(1)).await.unwrap();
        drop(held);
        assert!(StoreLock::acquire(&path, Duration::from_millis(250)).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "current_thread")]
    async fn test_waiter_acquires_once_holder_releases() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json.lock");

        let held = StoreLock::acquire(&path, Duration::from_secs(1)).await.unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            drop(held);
        });

        let lock = StoreLock::acquire(&path, Duration::from_secs(5)).await.unwrap();
        assert_eq!(lock.path(), path.as_path());
        release.await.unwrap();
    }
}
