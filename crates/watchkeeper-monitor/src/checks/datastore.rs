//! SQLite data store integrity.

use std::path::PathBuf;

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use tracing::warn;

use super::{MetricSource, blocking};
use crate::error::MonitorError;
use crate::sample::Metric;

/// Runs `PRAGMA quick_check` on a read-only connection.
/// Reads 0 when the database is intact, 1 otherwise.
pub struct DatastoreSource {
    path: PathBuf,
}

impl DatastoreSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MetricSource for DatastoreSource {
    fn metric(&self) -> Metric {
        Metric::DatastoreIntegrity
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        let path = self.path.clone();
        blocking(Metric::DatastoreIntegrity, move || quick_check(&path)).await
    }
}

fn quick_check(path: &std::path::Path) -> Result<f64, MonitorError> {
    let unavailable = |reason: String| MonitorError::sensor("datastore_integrity", reason);

    if !path.is_file() {
        return Err(unavailable(format!("{} does not exist", path.display())));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| unavailable(format!("cannot open {}: {}", path.display(), e)))?;

    let rows = conn.prepare("PRAGMA quick_check").and_then(|mut stmt| {
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>();
        rows
    });

    match rows {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => Ok(0.0),
        Ok(rows) => {
            warn!(
                "Integrity check of {} reported {} problem(s), first: {}",
                path.display(),
                rows.len(),
                rows.first().map(String::as_str).unwrap_or("<none>")
            );
            Ok(1.0)
        }
        Err(rusqlite::Error::SqliteFailure(e, msg))
            if matches!(e.code, ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase) =>
        {
            warn!(
                "{} is not a readable database: {}",
                path.display(),
                msg.unwrap_or_else(|| e.to_string())
            );
            Ok(1.0)
        }
        Err(e) => Err(unavailable(format!("quick_check failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_intact_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE trades (id INTEGER PRIMARY KEY, symbol TEXT);
                 INSERT INTO trades (symbol) VALUES ('EURUSD'), ('GBPUSD');",
            )
            .unwrap();
        }

        let source = DatastoreSource::new(&path);
        assert_eq!(source.read().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_garbage_file_reads_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        let source = DatastoreSource::new(&path);
        assert_eq!(source.read().await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let source = DatastoreSource::new(dir.path().join("missing.db"));
        let err = source.read().await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_check_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.db");
        assert!(quick_check(&path).is_err());
        assert!(!path.exists());
    }
}
