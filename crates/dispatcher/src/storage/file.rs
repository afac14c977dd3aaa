//! FileStorage - one JSON-lines file per model

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use contracts::{ContractError, Model, NoneStreamDao, StorageDao, StorageRow, StreamDescriptor};

/// Storage writing `<base_path>/<model>.jsonl`.
///
/// Files are append-only; the last line for an id is the current row.
/// Expiry rewrites the file. Every DAO of one file shares one lock, so a
/// replaced worker still draining cannot race its successor.
pub struct FileStorage {
    base_path: PathBuf,
    locks: std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl FileStorage {
    /// Create storage rooted at `base_path`, creating the directory
    pub fn new(base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            locks: std::sync::Mutex::new(HashMap::new()),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn model_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{name}.jsonl"))
    }

    /// Write lock of a model file, created on first use
    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Current rows of a model (last line per id wins), ordered by id
    pub async fn rows(&self, model: &str) -> Result<Vec<StorageRow>, ContractError> {
        let lines = read_lines(&self.model_path(model)).await?;
        Ok(latest_rows(lines).into_values().collect())
    }
}

impl StorageDao for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    fn new_none_stream_dao(
        &self,
        stream: &StreamDescriptor,
    ) -> Result<Arc<dyn NoneStreamDao>, ContractError> {
        let path = self.model_path(&stream.name);
        debug!(stream = %stream.name, path = %path.display(), "File none-stream DAO created");
        let lock = self.path_lock(&path);
        Ok(Arc::new(FileNoneStreamDao { path, lock }))
    }
}

/// DAO for one model file; writes are serialized by the shared `lock`
struct FileNoneStreamDao {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

#[async_trait]
impl NoneStreamDao for FileNoneStreamDao {
    #[instrument(name = "file_dao_insert", skip(self, model, row), fields(stream = %model.name, id = %row.id))]
    async fn insert(&self, model: &Model, row: StorageRow) -> Result<(), ContractError> {
        let mut line = serde_json::to_vec(&row)
            .map_err(|e| ContractError::storage_write(model.name.as_str(), e.to_string()))?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    #[instrument(name = "file_dao_delete_expired", skip(self, model), fields(stream = %model.name))]
    async fn delete_expired(
        &self,
        model: &Model,
        deadline_bucket: i64,
    ) -> Result<usize, ContractError> {
        let _guard = self.lock.lock().await;
        let current = latest_rows(read_lines(&self.path).await?);
        let before = current.len();
        let kept: Vec<_> = current
            .into_values()
            .filter(|row| row.time_bucket >= deadline_bucket)
            .collect();
        let removed = before - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let mut content = Vec::new();
        for row in &kept {
            serde_json::to_writer(&mut content, row)
                .map_err(|e| ContractError::storage_write(model.name.as_str(), e.to_string()))?;
            content.push(b'\n');
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(removed)
    }
}

/// Collapse appended lines to the last row per id
fn latest_rows(lines: Vec<StorageRow>) -> BTreeMap<String, StorageRow> {
    let mut current = BTreeMap::new();
    for row in lines {
        current.insert(row.id.clone(), row);
    }
    current
}

async fn read_lines(path: &Path) -> Result<Vec<StorageRow>, ContractError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                ContractError::Other(format!("corrupt row in {}: {e}", path.display()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Downsampling, ScopeId, StorageDescriptor};
    use tempfile::tempdir;

    fn descriptor() -> StreamDescriptor {
        StreamDescriptor::none_stream("alarm_rule_config", ScopeId::ALARM_RULE)
    }

    fn model() -> Model {
        Model::new(
            "alarm_rule_config",
            ScopeId::ALARM_RULE,
            StorageDescriptor::record_like("alarm_rule_config".into(), Downsampling::Second),
            true,
        )
    }

    fn row(id: &str, time_bucket: i64, expression: &str) -> StorageRow {
        let mut data = serde_json::Map::new();
        data.insert("expression".into(), expression.into());
        StorageRow {
            id: id.to_string(),
            time_bucket,
            data,
        }
    }

    #[tokio::test]
    async fn test_file_insert_last_line_wins() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let dao = storage.new_none_stream_dao(&descriptor()).unwrap();

        dao.insert(&model(), row("r1", 1, "a > 1")).await.unwrap();
        dao.insert(&model(), row("r1", 2, "a > 2")).await.unwrap();
        dao.insert(&model(), row("r2", 3, "b > 1")).await.unwrap();

        assert!(dir.path().join("alarm_rule_config.jsonl").exists());

        let rows = storage.rows("alarm_rule_config").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].data["expression"], "a > 2");
    }

    #[tokio::test]
    async fn test_file_delete_expired_rewrites() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let dao = storage.new_none_stream_dao(&descriptor()).unwrap();

        dao.insert(&model(), row("old", 100, "x")).await.unwrap();
        dao.insert(&model(), row("new", 300, "y")).await.unwrap();

        assert_eq!(dao.delete_expired(&model(), 200).await.unwrap(), 1);
        assert_eq!(dao.delete_expired(&model(), 200).await.unwrap(), 0);

        let rows = storage.rows("alarm_rule_config").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "new");
    }

    #[test]
    fn test_daos_of_one_stream_share_lock() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let path = storage.model_path("alarm_rule_config");

        assert!(Arc::ptr_eq(&storage.path_lock(&path), &storage.path_lock(&path)));
        assert!(!Arc::ptr_eq(
            &storage.path_lock(&path),
            &storage.path_lock(&storage.model_path("ui_template"))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_expiry_does_not_lose_appends_from_replacement_dao() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let old_dao = storage.new_none_stream_dao(&descriptor()).unwrap();
        let new_dao = storage.new_none_stream_dao(&descriptor()).unwrap();

        for i in 0..20 {
            old_dao
                .insert(&model(), row(&format!("old-{i}"), 100, "x"))
                .await
                .unwrap();
        }

        let writer = tokio::spawn(async move {
            for i in 0..50 {
                new_dao
                    .insert(&model(), row(&format!("new-{i}"), 300, "y"))
                    .await
                    .unwrap();
            }
        });
        let expirer = tokio::spawn(async move {
            let mut removed = 0;
            for _ in 0..50 {
                removed += old_dao.delete_expired(&model(), 200).await.unwrap();
                tokio::task::yield_now().await;
            }
            removed
        });

        writer.await.unwrap();
        let removed = expirer.await.unwrap();
        assert!(removed <= 20);

        let rows = storage.rows("alarm_rule_config").await.unwrap();
        let fresh = rows.iter().filter(|r| r.id.starts_with("new-")).count();
        assert_eq!(fresh, 50);
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert!(storage.rows("nothing").await.unwrap().is_empty());
    }
}
