
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const LOCK_TIMEOUT: Duration = Duration::from_secs(1);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_put_and_get() {
        let store = MemoryAlertStore::new();
        let key = AlertKey::new("high_cpu");

        assert!(store.get(&key).await.unwrap().is_none());

        store.put(AlertRecord::new(key.clone(), at(1_000))).await.unwrap();
        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.last_sent, 1_000);

        // Overwrite
        store.put(AlertRecord::new(key.clone(), at(2_000))).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap().last_sent, 2_000);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_remove_expired() {
        let store = MemoryAlertStore::new();
        store.put(AlertRecord::new("old".into(), at(100))).await.unwrap();
        store.put(AlertRecord::new("new".into(), at(500))).await.unwrap();
        store.put(AlertRecord::new("ahead".into(), at(900))).await.unwrap();

        let removed = store.remove_expired(at(300), at(500)).await.unwrap();
        assert_eq!(removed, vec![AlertKey::new("ahead"), AlertKey::new("old")]);

        let remaining = store.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].key.as_str(), "new");
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        // Opening alone does not create the store file
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("alerts.json");

        {
            let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
            store.put(AlertRecord::new("high_cpu".into(), at(1_700_000_000))).await.unwrap();
            store.put(AlertRecord::new("service_failure".into(), at(1_700_000_100))).await.unwrap();
        }

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            store.get(&"high_cpu".into()).await.unwrap().unwrap().last_sent,
            1_700_000_000
        );
    }

    #[tokio::test]
    async fn test_file_store_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        store.put(AlertRecord::new("high_disk".into(), at(42))).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["records"]["high_disk"], 42);
    }

    #[tokio::test]
    async fn test_file_store_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        for i in 0..5 {
            store.put(AlertRecord::new("high_cpu".into(), at(i))).await.unwrap();
        }

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.contains(".tmp-")), "{:?}", names);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");
        std::fs::write(&path, "{\"version\": 1, \"records\": {\"high_cpu\": ").unwrap();

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        // Next write replaces the corrupt file with a valid one
        store.put(AlertRecord::new("high_cpu".into(), at(10))).await.unwrap();
        drop(store);
        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_unknown_version_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");
        std::fs::write(&path, r#"{"version": 99, "records": {"high_cpu": 10}}"#).unwrap();

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_deleted_externally() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");

        {
            let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
            store.put(AlertRecord::new("high_cpu".into(), at(10))).await.unwrap();
        }
        std::fs::remove_file(&path).unwrap();

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        assert!(store.get(&"high_cpu".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_remove_expired_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");

        {
            let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
            store.put(AlertRecord::new("old".into(), at(100))).await.unwrap();
            store.put(AlertRecord::new("new".into(), at(900))).await.unwrap();
            let removed = store.remove_expired(at(500), at(900)).await.unwrap();
            assert_eq!(removed.len(), 1);
        }

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        let keys: Vec<_> = store.list().await.unwrap().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![AlertKey::new("new")]);
    }

    #[tokio::test]
    async fn test_file_store_loads_extreme_timestamps() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");
        std::fs::write(
            &path,
            r#"{"version":1,"records":{"high_cpu":-9223372036854775808,"high_disk":4102444800}}"#,
        )
        .unwrap();

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);

        let now = at(1_700_000_000);
        let removed = store.remove_expired(at(0), now).await.unwrap();
        assert_eq!(
            removed,
            vec![AlertKey::new("high_cpu"), AlertKey::new("high_disk")]
        );
        drop(store);

        let store = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alerts.json");

        let _first = FileAlertStore::open(&path, LOCK_TIMEOUT).await.unwrap();
        let second = FileAlertStore::open(&path, Duration::from_millis(200)).await;
        assert!(matches!(second, Err(StoreError::LockTimeout { .. })));
    }
