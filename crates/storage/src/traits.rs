use async_trait::async_trait;

use pvdesk_core::{PvRecord, PvType};

use crate::error::StorageError;
use crate::record::{ActivityRecord, TaskRecord, UserRecord};

/// The storage trait for PV backends.
///
/// A `PvStorage` implementation provides durable storage for PV records,
/// per-type sequence counters, and the task/user collaborator records the
/// lifecycle operations touch.
///
/// ## Counter atomicity
///
/// `next_sequence` MUST be a single atomic increment-and-fetch: two
/// concurrent creations of the same type must never receive the same number.
/// A read-then-write counter reintroduces a duplicate-numbering race and is
/// not a conforming implementation. Counters are created lazily at 1, only
/// ever incremented, and survive record deletion (gap-tolerant numbering).
///
/// ## Concurrency
///
/// Everything else is last-writer-wins; no optimistic concurrency token is
/// checked on update or delete. Implementations must be
/// `Send + Sync + 'static` to be used in axum application state.
///
/// The `conformance` module provides a backend-agnostic suite verifying
/// these contracts.
#[async_trait]
pub trait PvStorage: Send + Sync + 'static {
    // ── Sequence counters ────────────────────────────────────────────────────

    /// Atomically increment and return the counter for `kind`, creating it
    /// at 1 if absent.
    async fn next_sequence(&self, kind: PvType) -> Result<u32, StorageError>;

    /// Current counter value for `kind` without incrementing (0 if the
    /// counter was never used).
    async fn counter_value(&self, kind: PvType) -> Result<u32, StorageError>;

    // ── PV records ───────────────────────────────────────────────────────────

    /// Insert a new PV record.
    async fn insert_pv(&self, record: PvRecord) -> Result<(), StorageError>;

    /// Read one PV record. `Err(StorageError::PvNotFound)` if absent.
    async fn get_pv(&self, id: &str) -> Result<PvRecord, StorageError>;

    /// All PV records referencing `task_id`, in unspecified order.
    async fn list_pvs_by_task(&self, task_id: &str) -> Result<Vec<PvRecord>, StorageError>;

    /// Overwrite an existing PV record (matched by `record.id`).
    /// `Err(StorageError::PvNotFound)` if absent.
    async fn update_pv(&self, record: PvRecord) -> Result<(), StorageError>;

    /// Delete a PV record. `Err(StorageError::PvNotFound)` if absent.
    /// Never resets or reuses the record's sequence number.
    async fn delete_pv(&self, id: &str) -> Result<(), StorageError>;

    // ── Task collaborator ────────────────────────────────────────────────────

    /// Insert a task record (seeding and tests).
    async fn insert_task(&self, task: TaskRecord) -> Result<(), StorageError>;

    /// Read one task. `Err(StorageError::TaskNotFound)` if absent.
    async fn get_task(&self, id: &str) -> Result<TaskRecord, StorageError>;

    /// Append `pv_id` to the task's `pvs[]`.
    async fn link_pv(&self, task_id: &str, pv_id: &str) -> Result<(), StorageError>;

    /// Remove `pv_id` from the task's `pvs[]`. Idempotent: removing an id
    /// that is not present is not an error.
    async fn unlink_pv(&self, task_id: &str, pv_id: &str) -> Result<(), StorageError>;

    /// Append an entry to the task's activity log.
    async fn append_activity(
        &self,
        task_id: &str,
        entry: ActivityRecord,
    ) -> Result<(), StorageError>;

    // ── User collaborator ────────────────────────────────────────────────────

    /// Insert a user record (seeding and tests).
    async fn insert_user(&self, user: UserRecord) -> Result<(), StorageError>;

    /// Read one user. `Err(StorageError::UserNotFound)` if absent.
    async fn get_user(&self, id: &str) -> Result<UserRecord, StorageError>;
}
