use std::future::Future;

use pvdesk_core::PvType;

use super::{make_pv, TestResult};
use crate::{PvStorage, StorageError};

pub(super) async fn run_crud_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "crud",
        "insert_then_get_returns_record",
        insert_then_get_returns_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "crud",
        "get_missing_returns_pv_not_found",
        get_missing_returns_pv_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "crud",
        "list_filters_by_task",
        list_filters_by_task(factory).await,
    ));
    results.push(TestResult::from_result(
        "crud",
        "update_overwrites_existing",
        update_overwrites_existing(factory).await,
    ));
    results.push(TestResult::from_result(
        "crud",
        "update_missing_returns_pv_not_found",
        update_missing_returns_pv_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "crud",
        "delete_removes_record",
        delete_removes_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "crud",
        "double_delete_returns_pv_not_found",
        double_delete_returns_pv_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "crud",
        "delete_does_not_reset_counter",
        delete_does_not_reset_counter(factory).await,
    ));

    results
}

async fn insert_then_get_returns_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_pv(make_pv("pv-1", "task-1", PvType::Surveillance, 1))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    let record = storage.get_pv("pv-1").await.map_err(|e| format!("get: {e}"))?;
    if record.task_id != "task-1" {
        return Err(format!("wrong task_id: {}", record.task_id));
    }
    if record.pv_type() != PvType::Surveillance {
        return Err("wrong pv type".to_string());
    }
    Ok(())
}

async fn get_missing_returns_pv_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    match storage.get_pv("nope").await {
        Err(StorageError::PvNotFound { id }) if id == "nope" => Ok(()),
        Err(e) => Err(format!("wrong error variant: {e}")),
        Ok(_) => Err("expected PvNotFound, got a record".to_string()),
    }
}

async fn list_filters_by_task<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_pv(make_pv("pv-1", "task-1", PvType::Surveillance, 1))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    storage
        .insert_pv(make_pv("pv-2", "task-1", PvType::Depotage, 1))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    storage
        .insert_pv(make_pv("pv-3", "task-2", PvType::Surveillance, 2))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let pvs = storage
        .list_pvs_by_task("task-1")
        .await
        .map_err(|e| format!("list: {e}"))?;
    if pvs.len() != 2 {
        return Err(format!("expected 2 records for task-1, got {}", pvs.len()));
    }
    if pvs.iter().any(|pv| pv.task_id != "task-1") {
        return Err("record from another task leaked into the list".to_string());
    }
    Ok(())
}

async fn update_overwrites_existing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_pv(make_pv("pv-1", "task-1", PvType::Surveillance, 1))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let mut record = make_pv("pv-1", "task-1", PvType::Surveillance, 1);
    record.common.navire = "MV Updated".to_string();
    record.is_completed = true;
    storage
        .update_pv(record)
        .await
        .map_err(|e| format!("update: {e}"))?;

    let stored = storage.get_pv("pv-1").await.map_err(|e| format!("get: {e}"))?;
    if stored.common.navire != "MV Updated" || !stored.is_completed {
        return Err("update was not persisted".to_string());
    }
    Ok(())
}

async fn update_missing_returns_pv_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    match storage
        .update_pv(make_pv("ghost", "task-1", PvType::Depotage, 1))
        .await
    {
        Err(StorageError::PvNotFound { .. }) => Ok(()),
        Err(e) => Err(format!("wrong error variant: {e}")),
        Ok(()) => Err("expected PvNotFound, update succeeded".to_string()),
    }
}

async fn delete_removes_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_pv(make_pv("pv-1", "task-1", PvType::Depotage, 1))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    storage
        .delete_pv("pv-1")
        .await
        .map_err(|e| format!("delete: {e}"))?;
    match storage.get_pv("pv-1").await {
        Err(StorageError::PvNotFound { .. }) => Ok(()),
        Err(e) => Err(format!("wrong error variant: {e}")),
        Ok(_) => Err("record still readable after delete".to_string()),
    }
}

async fn double_delete_returns_pv_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_pv(make_pv("pv-1", "task-1", PvType::Depotage, 1))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    storage
        .delete_pv("pv-1")
        .await
        .map_err(|e| format!("first delete: {e}"))?;
    match storage.delete_pv("pv-1").await {
        Err(StorageError::PvNotFound { .. }) => Ok(()),
        Err(e) => Err(format!("wrong error variant: {e}")),
        Ok(()) => Err("second delete succeeded".to_string()),
    }
}

/// Deleting a record never resets the counter: numbering is gap-tolerant.
async fn delete_does_not_reset_counter<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    let first = storage
        .next_sequence(PvType::Surveillance)
        .await
        .map_err(|e| format!("next_sequence: {e}"))?;
    storage
        .insert_pv(make_pv("pv-1", "task-1", PvType::Surveillance, first))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    storage
        .delete_pv("pv-1")
        .await
        .map_err(|e| format!("delete: {e}"))?;

    let second = storage
        .next_sequence(PvType::Surveillance)
        .await
        .map_err(|e| format!("next_sequence: {e}"))?;
    if second != first + 1 {
        return Err(format!(
            "expected {} after deleting the holder of {first}, got {second}",
            first + 1
        ));
    }
    Ok(())
}
