//! In-process storage backend.
//!
//! Backs the bundled server and the test suites. All state lives behind one
//! `tokio::sync::RwLock`; `next_sequence` increments under the write lock,
//! which makes it a single atomic increment-and-fetch.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pvdesk_core::{PvRecord, PvType};

use crate::error::StorageError;
use crate::record::{ActivityRecord, TaskRecord, UserRecord};
use crate::traits::PvStorage;

#[derive(Default)]
struct MemoryInner {
    counters: HashMap<PvType, u32>,
    pvs: HashMap<String, PvRecord>,
    tasks: HashMap<String, TaskRecord>,
    users: HashMap<String, UserRecord>,
}

/// In-memory `PvStorage` backend.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PvStorage for MemoryStorage {
    async fn next_sequence(&self, kind: PvType) -> Result<u32, StorageError> {
        let mut inner = self.inner.write().await;
        let seq = inner.counters.entry(kind).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn counter_value(&self, kind: PvType) -> Result<u32, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.counters.get(&kind).copied().unwrap_or(0))
    }

    async fn insert_pv(&self, record: PvRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner.pvs.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_pv(&self, id: &str) -> Result<PvRecord, StorageError> {
        let inner = self.inner.read().await;
        inner
            .pvs
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::PvNotFound { id: id.to_string() })
    }

    async fn list_pvs_by_task(&self, task_id: &str) -> Result<Vec<PvRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .pvs
            .values()
            .filter(|pv| pv.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn update_pv(&self, record: PvRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if !inner.pvs.contains_key(&record.id) {
            return Err(StorageError::PvNotFound {
                id: record.id.clone(),
            });
        }
        inner.pvs.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete_pv(&self, id: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .pvs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::PvNotFound { id: id.to_string() })
    }

    async fn insert_task(&self, task: TaskRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<TaskRecord, StorageError> {
        let inner = self.inner.read().await;
        inner
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::TaskNotFound { id: id.to_string() })
    }

    async fn link_pv(&self, task_id: &str, pv_id: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        task.pvs.push(pv_id.to_string());
        Ok(())
    }

    async fn unlink_pv(&self, task_id: &str, pv_id: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        task.pvs.retain(|id| id != pv_id);
        Ok(())
    }

    async fn append_activity(
        &self,
        task_id: &str,
        entry: ActivityRecord,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        task.activities.push(entry);
        Ok(())
    }

    async fn insert_user(&self, user: UserRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<UserRecord, StorageError> {
        let inner = self.inner.read().await;
        inner
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::UserNotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;

    #[tokio::test]
    async fn memory_backend_passes_conformance() {
        let report = run_conformance_suite(|| async { MemoryStorage::new() }).await;
        assert!(report.failed == 0, "{report}");
    }
}
