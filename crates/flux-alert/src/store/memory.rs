use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AlertStore, KeyedLocks, ResourceLock};
use crate::error::{AlertError, Result};
use crate::model::{Condition, Resource};

/// 内存存储
#[derive(Default)]
pub struct MemoryStore {
    resources: Arc<RwLock<HashMap<String, Resource>>>,
    conditions: Arc<RwLock<HashMap<String, Condition>>>,
    locks: KeyedLocks,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn get_resource(&self, resource_id: &str) -> Result<Resource> {
        let resources = self.resources.read().await;
        resources
            .get(resource_id)
            .cloned()
            .ok_or_else(|| AlertError::ResourceNotFound(resource_id.to_string()))
    }

    async fn save_resource(&self, resource: &Resource) -> Result<()> {
        let mut resources = self.resources.write().await;
        resources.insert(resource.id.clone(), resource.clone());
        Ok(())
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        let resources = self.resources.read().await;
        let mut list: Vec<Resource> = resources.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    async fn get_condition(&self, condition_id: &str) -> Result<Condition> {
        let conditions = self.conditions.read().await;
        conditions
            .get(condition_id)
            .cloned()
            .ok_or_else(|| AlertError::ConditionNotFound(condition_id.to_string()))
    }

    async fn save_condition(&self, condition: &Condition) -> Result<()> {
        let mut conditions = self.conditions.write().await;
        conditions.insert(condition.id.clone(), condition.clone());
        Ok(())
    }

    async fn lock(&self, resource_id: &str) -> Result<ResourceLock> {
        Ok(self.locks.acquire(resource_id).await)
    }
}
