use std::future::Future;

use super::TestResult;
use crate::record::{ActivityRecord, TaskRecord, UserRecord};
use crate::{PvStorage, StorageError};

pub(super) async fn run_task_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "task",
        "link_appends_to_pvs",
        link_appends_to_pvs(factory).await,
    ));
    results.push(TestResult::from_result(
        "task",
        "unlink_removes_and_is_idempotent",
        unlink_removes_and_is_idempotent(factory).await,
    ));
    results.push(TestResult::from_result(
        "task",
        "link_missing_task_returns_task_not_found",
        link_missing_task_returns_task_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "task",
        "activities_append_in_order",
        activities_append_in_order(factory).await,
    ));
    results.push(TestResult::from_result(
        "task",
        "users_insert_and_get",
        users_insert_and_get(factory).await,
    ));

    results
}

async fn link_appends_to_pvs<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_task(TaskRecord::new("task-1", "Inspection"))
        .await
        .map_err(|e| format!("insert_task: {e}"))?;
    storage
        .link_pv("task-1", "pv-1")
        .await
        .map_err(|e| format!("link: {e}"))?;
    storage
        .link_pv("task-1", "pv-2")
        .await
        .map_err(|e| format!("link: {e}"))?;

    let task = storage
        .get_task("task-1")
        .await
        .map_err(|e| format!("get_task: {e}"))?;
    if task.pvs != vec!["pv-1".to_string(), "pv-2".to_string()] {
        return Err(format!("unexpected pvs list: {:?}", task.pvs));
    }
    Ok(())
}

async fn unlink_removes_and_is_idempotent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_task(TaskRecord::new("task-1", "Inspection"))
        .await
        .map_err(|e| format!("insert_task: {e}"))?;
    storage
        .link_pv("task-1", "pv-1")
        .await
        .map_err(|e| format!("link: {e}"))?;
    storage
        .link_pv("task-1", "pv-2")
        .await
        .map_err(|e| format!("link: {e}"))?;

    storage
        .unlink_pv("task-1", "pv-1")
        .await
        .map_err(|e| format!("unlink: {e}"))?;
    // Removing an id that is no longer present must not fail.
    storage
        .unlink_pv("task-1", "pv-1")
        .await
        .map_err(|e| format!("second unlink: {e}"))?;

    let task = storage
        .get_task("task-1")
        .await
        .map_err(|e| format!("get_task: {e}"))?;
    if task.pvs != vec!["pv-2".to_string()] {
        return Err(format!("unexpected pvs list: {:?}", task.pvs));
    }
    Ok(())
}

async fn link_missing_task_returns_task_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    match storage.link_pv("ghost", "pv-1").await {
        Err(StorageError::TaskNotFound { id }) if id == "ghost" => Ok(()),
        Err(e) => Err(format!("wrong error variant: {e}")),
        Ok(()) => Err("expected TaskNotFound, link succeeded".to_string()),
    }
}

async fn activities_append_in_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_task(TaskRecord::new("task-1", "Inspection"))
        .await
        .map_err(|e| format!("insert_task: {e}"))?;

    for (i, text) in ["a créé un PV de surveillance", "a mis à jour le PV: SURV-001"]
        .iter()
        .enumerate()
    {
        storage
            .append_activity(
                "task-1",
                ActivityRecord::commented(*text, "user-1", &format!("2025-01-01T00:0{i}:00Z")),
            )
            .await
            .map_err(|e| format!("append {i}: {e}"))?;
    }

    let task = storage
        .get_task("task-1")
        .await
        .map_err(|e| format!("get_task: {e}"))?;
    if task.activities.len() != 2 {
        return Err(format!("expected 2 activities, got {}", task.activities.len()));
    }
    if task.activities[0].activity != "a créé un PV de surveillance"
        || task.activities[1].activity != "a mis à jour le PV: SURV-001"
    {
        return Err("activities out of order".to_string());
    }
    if task.activities.iter().any(|a| a.kind != "commented") {
        return Err("activity kind must be 'commented'".to_string());
    }
    Ok(())
}

async fn users_insert_and_get<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    storage
        .insert_user(UserRecord {
            id: "user-1".to_string(),
            name: "Amina".to_string(),
            email: "amina@example.com".to_string(),
        })
        .await
        .map_err(|e| format!("insert_user: {e}"))?;

    let user = storage
        .get_user("user-1")
        .await
        .map_err(|e| format!("get_user: {e}"))?;
    if user.name != "Amina" || user.email != "amina@example.com" {
        return Err("user fields not persisted".to_string());
    }

    match storage.get_user("ghost").await {
        Err(StorageError::UserNotFound { .. }) => Ok(()),
        Err(e) => Err(format!("wrong error variant: {e}")),
        Ok(_) => Err("expected UserNotFound".to_string()),
    }
}
