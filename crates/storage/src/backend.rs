use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, warn};

use heartwatch_core::ScheduleRecord;

use crate::error::StorageError;

/// Keyed storage for schedule records, one per event name.
///
/// Each call is independent; callers do read → transform → write. Writes are
/// full upserts and the last writer wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<ScheduleRecord>, StorageError>;

    async fn put(&self, record: &ScheduleRecord) -> Result<(), StorageError>;

    /// All records, in no particular order.
    async fn scan(&self) -> Result<Vec<ScheduleRecord>, StorageError>;

    /// Backend name for logs (e.g. "memory", "file").
    fn backend_name(&self) -> &str;
}

/// Process-local store, used for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, ScheduleRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ScheduleRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.name.clone(), r)).collect();
        Self {
            records: RwLock::new(map),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<ScheduleRecord>, StorageError> {
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn put(&self, record: &ScheduleRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .await
            .insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<ScheduleRecord>, StorageError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Records persisted as a pretty-printed JSON array under `data_dir`.
///
/// Entries are decoded one at a time: an entry that no longer matches the
/// record shape only fails lookups for its own name and is skipped by
/// `scan`. Writes keep every other entry untouched, unreadable ones too.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous contents intact. The in-process
/// mutex serializes read-modify-write cycles from concurrent tasks.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "records.json";

    pub fn new(data_dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(Self::FILE_NAME);
        info!(path = %path.display(), "File record store opened");
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Value>, StorageError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    async fn save(&self, entries: &[Value]) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = entries.len(), "Records saved");
        Ok(())
    }
}

fn entry_name(entry: &Value) -> Option<&str> {
    entry.get("name").and_then(Value::as_str)
}

#[async_trait]
impl RecordStore for FileStore {
    async fn get(&self, name: &str) -> Result<Option<ScheduleRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        match entries.into_iter().find(|e| entry_name(e) == Some(name)) {
            Some(entry) => Ok(Some(serde_json::from_value(entry)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &ScheduleRecord) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let value = serde_json::to_value(record)?;
        match entries.iter_mut().find(|e| entry_name(e) == Some(record.name.as_str())) {
            Some(slot) => *slot = value,
            None => entries.push(value),
        }
        self.save(&entries).await
    }

    async fn scan(&self) -> Result<Vec<ScheduleRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry_name(&entry).unwrap_or("<unnamed>").to_string();
            match serde_json::from_value::<ScheduleRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => warn!(name = %name, error = %e, "Skipping unreadable record"),
            }
        }
        Ok(records)
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartwatch_core::PeriodType;

    fn record(name: &str) -> ScheduleRecord {
        ScheduleRecord::with_schedule(name, 60, PeriodType::Rolling)
    }

    #[tokio::test]
    async fn memory_get_put_scan() {
        let store = MemoryStore::new();
        assert!(store.get("a").await.unwrap().is_none());

        store.put(&record("a")).await.unwrap();
        store.put(&record("b")).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(record("a")));
        assert_eq!(store.scan().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn memory_put_overwrites() {
        let store = MemoryStore::with_records([record("a")]);
        let mut updated = record("a");
        updated.error_count = 5;
        store.put(&updated).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().unwrap().error_count, 5);
        assert_eq!(store.scan().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(tmp.path()).unwrap();
            let mut r = record("nightly");
            r.description = Some("nightly backup".into());
            r.next_block_time = Some(1_000);
            store.put(&r).await.unwrap();
        }

        let store = FileStore::new(tmp.path()).unwrap();
        let loaded = store.get("nightly").await.unwrap().unwrap();
        assert_eq!(loaded.description.as_deref(), Some("nightly backup"));
        assert_eq!(loaded.next_block_time, Some(1_000));
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn file_store_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(&tmp.path().join("nested")).unwrap();
        assert!(store.scan().await.unwrap().is_empty());
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_reads_partial_records() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(FileStore::FILE_NAME),
            r#"[{"name":"blank"},{"name":"odd","period_seconds":5,"period_type":"weekly"}]"#,
        )
        .unwrap();

        let store = FileStore::new(tmp.path()).unwrap();
        let blank = store.get("blank").await.unwrap().unwrap();
        assert_eq!(blank.period_seconds, None);
        let odd = store.get("odd").await.unwrap().unwrap();
        assert_eq!(odd.period_type, Some(PeriodType::Unrecognized));
    }

    #[tokio::test]
    async fn file_store_corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(FileStore::FILE_NAME), "not json").unwrap();
        let store = FileStore::new(tmp.path()).unwrap();
        assert!(matches!(store.scan().await, Err(StorageError::Serialize(_))));
    }

    #[tokio::test]
    async fn file_store_isolates_a_bad_entry() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(FileStore::FILE_NAME),
            r#"[{"name":"good","period_seconds":60,"period_type":"rolling"},
                {"name":"bad","period_seconds":-5}]"#,
        )
        .unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        assert_eq!(store.get("good").await.unwrap().unwrap().period_seconds, Some(60));
        assert!(matches!(store.get("bad").await, Err(StorageError::Serialize(_))));
        assert_eq!(store.scan().await.unwrap().len(), 1);

        store.put(&record("fresh")).await.unwrap();
        store.put(&record("good")).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let entries: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1]["period_seconds"], -5);
        assert_eq!(store.scan().await.unwrap().len(), 2);
    }
}
