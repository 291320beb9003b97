use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AlertStore, KeyedLocks, ResourceLock};
use crate::error::{AlertError, Result};
use crate::model::{Condition, Resource};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    resources: BTreeMap<String, Resource>,
    #[serde(default)]
    conditions: BTreeMap<String, Condition>,
}

/// JSON 快照文件存储
///
/// 不做进程内缓存：每次读取都重新加载文件，外部对规则的修改在下一轮即可见。
/// 保存时在写锁内基于最新文件内容修改，先写临时文件再重命名覆盖。
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    locks: KeyedLocks,
}

impl FileStore {
    /// 打开存储文件并校验内容，文件不存在时视为空
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            locks: KeyedLocks::new(),
        };

        let snapshot = store.load().await?;
        info!(
            path = ?store.path,
            resources = snapshot.resources.len(),
            conditions = snapshot.conditions.len(),
            "Opened alert store"
        );

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Snapshot> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Snapshot::default());
        }
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 在写锁内读取最新快照、修改并写回
    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Snapshot) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.load().await?;
        apply(&mut snapshot);
        self.persist(&snapshot).await
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // 临时文件名唯一，避免多个进程写同一个文件时互相覆盖
        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&tmp, content).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AlertError::store(format!(
                "failed to replace {:?}: {}",
                self.path, e
            )));
        }

        debug!(path = ?self.path, "Alert store persisted");
        Ok(())
    }
}

#[async_trait]
impl AlertStore for FileStore {
    async fn get_resource(&self, resource_id: &str) -> Result<Resource> {
        self.load()
            .await?
            .resources
            .remove(resource_id)
            .ok_or_else(|| AlertError::ResourceNotFound(resource_id.to_string()))
    }

    async fn save_resource(&self, resource: &Resource) -> Result<()> {
        let resource = resource.clone();
        self.update(move |snapshot| {
            snapshot.resources.insert(resource.id.clone(), resource);
        })
        .await
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        Ok(self.load().await?.resources.into_values().collect())
    }

    async fn get_condition(&self, condition_id: &str) -> Result<Condition> {
        self.load()
            .await?
            .conditions
            .remove(condition_id)
            .ok_or_else(|| AlertError::ConditionNotFound(condition_id.to_string()))
    }

    async fn save_condition(&self, condition: &Condition) -> Result<()> {
        let condition = condition.clone();
        self.update(move |snapshot| {
            snapshot.conditions.insert(condition.id.clone(), condition);
        })
        .await
    }

    async fn lock(&self, resource_id: &str) -> Result<ResourceLock> {
        Ok(self.locks.acquire(resource_id).await)
    }
}
