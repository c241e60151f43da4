use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use pvdesk_core::PvType;

use super::TestResult;
use crate::PvStorage;

/// Number of concurrent tasks to spawn in the concurrency test.
const N: usize = 16;

pub(super) async fn run_counter_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "counter",
        "next_sequence_starts_at_1",
        next_sequence_starts_at_1(factory).await,
    ));
    results.push(TestResult::from_result(
        "counter",
        "next_sequence_strictly_increasing",
        next_sequence_strictly_increasing(factory).await,
    ));
    results.push(TestResult::from_result(
        "counter",
        "counters_independent_per_type",
        counters_independent_per_type(factory).await,
    ));
    results.push(TestResult::from_result(
        "counter",
        "counter_value_peeks_without_increment",
        counter_value_peeks_without_increment(factory).await,
    ));
    results.push(TestResult::from_result(
        "counter",
        "concurrent_next_sequence_all_distinct",
        concurrent_next_sequence_all_distinct(factory).await,
    ));

    results
}

/// The counter is created lazily: the first call for a type returns 1.
async fn next_sequence_starts_at_1<S, F, Fut>(factory: &F) -> Result<(), String>
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
    if first != 1 {
        return Err(format!("expected first value 1, got {first}"));
    }
    Ok(())
}

/// Sequential calls for the same type return strictly increasing values.
async fn next_sequence_strictly_increasing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    let mut last = 0;
    for i in 1..=20u32 {
        let value = storage
            .next_sequence(PvType::Depotage)
            .await
            .map_err(|e| format!("call {i}: {e}"))?;
        if value <= last {
            return Err(format!("call {i}: got {value} after {last}"));
        }
        last = value;
    }
    Ok(())
}

/// Surveillance and dépotage counters do not share state.
async fn counters_independent_per_type<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    for _ in 0..3 {
        storage
            .next_sequence(PvType::Surveillance)
            .await
            .map_err(|e| format!("surveillance: {e}"))?;
    }
    let depotage_first = storage
        .next_sequence(PvType::Depotage)
        .await
        .map_err(|e| format!("depotage: {e}"))?;
    if depotage_first != 1 {
        return Err(format!(
            "depotage counter should start at 1, got {depotage_first}"
        ));
    }
    Ok(())
}

/// `counter_value` reads without incrementing: 0 before first use, stable
/// across repeated peeks.
async fn counter_value_peeks_without_increment<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    let before = storage
        .counter_value(PvType::Surveillance)
        .await
        .map_err(|e| format!("peek: {e}"))?;
    if before != 0 {
        return Err(format!("expected 0 before first use, got {before}"));
    }
    storage
        .next_sequence(PvType::Surveillance)
        .await
        .map_err(|e| format!("next_sequence: {e}"))?;
    for _ in 0..3 {
        let after = storage
            .counter_value(PvType::Surveillance)
            .await
            .map_err(|e| format!("peek: {e}"))?;
        if after != 1 {
            return Err(format!("expected 1 after one increment, got {after}"));
        }
    }
    Ok(())
}

/// N tasks each take one value for the same type. The collected values must
/// be N distinct integers covering exactly 1..=N — no duplicates, no gaps.
async fn concurrent_next_sequence_all_distinct<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.next_sequence(PvType::Surveillance).await
        }));
    }

    let mut values = HashSet::new();
    for handle in handles {
        let value = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
        if !values.insert(value) {
            return Err(format!("duplicate sequence value {value}"));
        }
    }

    for expected in 1..=N as u32 {
        if !values.contains(&expected) {
            return Err(format!("missing sequence value {expected}"));
        }
    }

    Ok(())
}
