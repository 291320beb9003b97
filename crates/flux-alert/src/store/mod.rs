//! 资源与条件的持久化存储

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::Result;
use crate::model::{Condition, Resource};

/// 告警存储接口
///
/// `get_*` 在对象不存在时返回对应的 NotFound 错误，与其他存储错误区分。
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn get_resource(&self, resource_id: &str) -> Result<Resource>;

    async fn save_resource(&self, resource: &Resource) -> Result<()>;

    async fn list_resources(&self) -> Result<Vec<Resource>>;

    async fn get_condition(&self, condition_id: &str) -> Result<Condition>;

    async fn save_condition(&self, condition: &Condition) -> Result<()>;

    /// 获取资源级互斥锁，锁在返回值释放时解除
    async fn lock(&self, resource_id: &str) -> Result<ResourceLock>;
}

type LockMap = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

/// 资源互斥锁守卫
///
/// 释放时若没有其他持有者或等待者，从锁集合中移除对应条目。
pub struct ResourceLock {
    resource_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    registry: LockMap,
}

impl ResourceLock {
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }
}

impl Drop for ResourceLock {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = locks
            .get(&self.resource_id)
            .map_or(false, |lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&self.resource_id);
        }
    }
}

/// 按键分配的异步互斥锁集合
#[derive(Default)]
pub struct KeyedLocks {
    locks: LockMap,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &str) -> ResourceLock {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.to_string()).or_default().clone()
        };

        ResourceLock {
            resource_id: key.to_string(),
            guard: Some(lock.lock_owned().await),
            registry: self.locks.clone(),
        }
    }

    /// 当前登记的键数量
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
