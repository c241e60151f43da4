//! Conformance test suite for `PvStorage` implementations.
//!
//! Backend-agnostic checks that any `PvStorage` implementation can run to
//! verify correctness. The suite covers:
//!
//! - **Counter**: lazy creation at 1, strict monotonicity, per-type
//!   independence, distinct values under concurrent callers
//! - **CRUD**: insert/get/update/delete for PV records, not-found errors
//! - **Task**: link/unlink semantics, unlink idempotence, activity ordering
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use pvdesk_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_storage().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod counter;
mod crud;
mod task;

use std::fmt;
use std::future::Future;

use pvdesk_core::{
    DepotageBody, DepotageDetails, PvCommon, PvDetails, PvRecord, PvType, SurveillanceBody,
    SurveillanceDetails,
};

use crate::PvStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "counter", "crud", "task").
    pub category: String,
    /// Test name (e.g. "next_sequence_starts_at_1").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: PvStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(counter::run_counter_tests(&factory).await);
    results.extend(crud::run_crud_tests(&factory).await);
    results.extend(task::run_task_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

fn make_common() -> PvCommon {
    PvCommon {
        num_bl: "BL-1".to_string(),
        importateur: "ACME".to_string(),
        num_tc: "TC-1".to_string(),
        num_scelle: "S-1".to_string(),
        nb_colis: 10,
        navire: "MV Test".to_string(),
        port_chargement: "Shanghai".to_string(),
        port_dechargement: "Douala".to_string(),
        gros_article: "tubes".to_string(),
    }
}

fn make_pv(id: &str, task_id: &str, kind: PvType, num_pv: u32) -> PvRecord {
    let details = match kind {
        PvType::Surveillance => PvDetails::Surveillance(SurveillanceDetails {
            num_pv,
            num_facture: "F-1".to_string(),
            date_intervention: "2025-01-01T00:00:00Z".to_string(),
            transitaire: "T".to_string(),
            lieu_intervention: "Port".to_string(),
            nature_marchandise: "acier".to_string(),
            date_arrivee: "2025-01-01T00:00:00Z".to_string(),
            surveillance: SurveillanceBody::default(),
        }),
        PvType::Depotage => PvDetails::Depotage(DepotageDetails {
            num_pv,
            depotage: DepotageBody {
                num_cde: 1,
                lieu_depotage: String::new(),
                observations: String::new(),
                produit: String::new(),
                nuance: String::new(),
                quantite: 0,
                conteneur: Vec::new(),
                lot: Vec::new(),
            },
        }),
    };
    PvRecord {
        id: id.to_string(),
        task_id: task_id.to_string(),
        common: make_common(),
        details,
        created_by: "user-1".to_string(),
        is_completed: false,
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-01T00:00:00Z".to_string(),
    }
}
