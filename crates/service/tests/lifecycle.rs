//! Lifecycle tests for `PvService` over the in-memory backend.

use std::collections::HashSet;
use std::sync::Arc;

use pvdesk_core::{PvDetails, PvPayload, PvType};
use pvdesk_service::{PvService, ServiceError};
use pvdesk_storage::{MemoryStorage, PvStorage, TaskRecord, UserRecord};

async fn setup() -> (PvService<MemoryStorage>, Arc<MemoryStorage>) {
    let store = Arc::new(MemoryStorage::new());
    store
        .insert_task(TaskRecord::new("task-1", "Inspection navire"))
        .await
        .unwrap();
    store
        .insert_user(UserRecord {
            id: "user-1".to_string(),
            name: "Amina".to_string(),
            email: "amina@example.com".to_string(),
        })
        .await
        .unwrap();
    (PvService::new(store.clone()), store)
}

fn surveillance_payload() -> PvPayload {
    serde_json::from_value(serde_json::json!({
        "type": "surveillance",
        "numBL": "BL-1",
        "importateur": "ACME",
        "numTC": "TC-1",
        "numScelle": "S-1",
        "nbColis": 10,
        "navire": "MV Test",
        "portChargement": "Shanghai",
        "portDechargement": "Douala",
        "grosArticle": "tubes",
        "numFacture": "F-1",
        "transitaire": "Translog",
        "lieuIntervention": "Terminal 2",
        "natureMarchandise": "acier",
        "surveillance": {"Constation": "RAS"}
    }))
    .unwrap()
}

fn depotage_payload() -> PvPayload {
    serde_json::from_value(serde_json::json!({
        "type": "depotage",
        "numBL": "BL-2",
        "importateur": "ACME",
        "numTC": "TC-2",
        "numScelle": "S-2",
        "nbColis": "25",
        "navire": "MV Test",
        "portChargement": "Mumbai",
        "portDechargement": "Douala",
        "grosArticle": "barres",
        "depotage": {
            "numCde": "42",
            "lieuDepotage": "Magasin 3",
            "produit": "fer",
            "nuance": "A36",
            "quantite": "100",
            "lot": [{"numLot": "L1", "bonEtat": "10", "manquant": "2", "avarie": "1"}]
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn create_assigns_sequence_and_links_task() {
    let (service, store) = setup().await;

    let pv = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();
    assert_eq!(pv.pv_type(), PvType::Surveillance);
    assert_eq!(pv.details.number(), 1);
    assert_eq!(pv.label(), "SURV-001");
    assert!(!pv.is_completed);

    let task = store.get_task("task-1").await.unwrap();
    assert_eq!(task.pvs, vec![pv.id.clone()]);
    assert_eq!(task.activities.len(), 1);
    assert_eq!(task.activities[0].kind, "commented");
    assert_eq!(task.activities[0].activity, "a créé un PV de surveillance");
    assert_eq!(task.activities[0].by, "user-1");
}

#[tokio::test]
async fn sequences_are_per_type_and_strictly_increasing() {
    let (service, _store) = setup().await;

    let s1 = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();
    let d1 = service
        .create("task-1", &depotage_payload(), "user-1")
        .await
        .unwrap();
    let s2 = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();

    assert_eq!(s1.details.number(), 1);
    assert_eq!(s2.details.number(), 2);
    assert_eq!(d1.details.number(), 1);
    assert_eq!(d1.label(), "DEPO-001");
}

#[tokio::test]
async fn concurrent_creates_get_distinct_numbers() {
    let (service, _store) = setup().await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let svc = service.clone();
        handles.push(tokio::spawn(async move {
            svc.create("task-1", &surveillance_payload(), "user-1").await
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let pv = handle.await.unwrap().unwrap();
        assert!(
            numbers.insert(pv.details.number()),
            "duplicate sequence number {}",
            pv.details.number()
        );
    }
    assert_eq!(numbers.len(), 12);
    assert_eq!(numbers, (1..=12).collect::<HashSet<u32>>());
}

#[tokio::test]
async fn failed_validation_touches_nothing() {
    let (service, store) = setup().await;

    let mut data = surveillance_payload();
    data.num_facture = None;
    let err = service.create("task-1", &data, "user-1").await.unwrap_err();
    match err {
        ServiceError::Validation(e) => {
            assert!(e.to_string().contains("numFacture"), "{e}");
        }
        other => panic!("expected Validation, got {other}"),
    }

    // No record, no link, no activity, and crucially no counter increment.
    assert!(store.list_pvs_by_task("task-1").await.unwrap().is_empty());
    let task = store.get_task("task-1").await.unwrap();
    assert!(task.pvs.is_empty());
    assert!(task.activities.is_empty());
    assert_eq!(store.counter_value(PvType::Surveillance).await.unwrap(), 0);

    // The next successful create therefore starts at 1.
    let pv = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();
    assert_eq!(pv.details.number(), 1);
}

#[tokio::test]
async fn create_under_missing_task_fails() {
    let (service, _store) = setup().await;
    let err = service
        .create("ghost", &surveillance_payload(), "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::TaskNotFound));
}

#[tokio::test]
async fn depotage_create_coerces_lot_counts_and_seeds_conteneur() {
    let (service, _store) = setup().await;

    let pv = service
        .create("task-1", &depotage_payload(), "user-1")
        .await
        .unwrap();
    assert_eq!(pv.common.nb_colis, 25);

    let PvDetails::Depotage(details) = &pv.details else {
        panic!("expected depotage details");
    };
    let body = &details.depotage;
    assert_eq!(body.num_cde, 42);
    assert_eq!(body.quantite, 100);
    assert_eq!(body.lot.len(), 1);
    assert_eq!(body.lot[0].num_lot, "L1");
    assert_eq!(body.lot[0].bon_etat, 10);
    assert_eq!(body.lot[0].manquant, 2);
    assert_eq!(body.lot[0].avarie, 1);
    assert_eq!(body.conteneur.len(), 1);
    assert_eq!(body.conteneur[0].num_conteneur, "TC-2");
    assert_eq!(body.conteneur[0].num_scelle, "S-2");
    assert!(body.conteneur[0].conforme);
}

#[tokio::test]
async fn list_is_newest_first_with_resolved_author() {
    let (service, _store) = setup().await;

    let first = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = service
        .create("task-1", &depotage_payload(), "user-1")
        .await
        .unwrap();

    let views = service.pvs_by_task("task-1").await.unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].record.id, second.id);
    assert_eq!(views[1].record.id, first.id);

    let value = views.into_iter().next().unwrap().into_value();
    assert_eq!(value["createdBy"]["name"], "Amina");
    assert_eq!(value["createdBy"]["email"], "amina@example.com");
}

#[tokio::test]
async fn unknown_author_degrades_to_id_only() {
    let (service, _store) = setup().await;
    let pv = service
        .create("task-1", &surveillance_payload(), "user-2")
        .await
        .unwrap();
    let value = service.pv_by_id(&pv.id).await.unwrap().into_value();
    assert_eq!(value["createdBy"]["_id"], "user-2");
    assert!(value["createdBy"].get("name").is_none());
}

#[tokio::test]
async fn update_keeps_type_and_replaces_lots() {
    let (service, _store) = setup().await;
    let pv = service
        .create("task-1", &depotage_payload(), "user-1")
        .await
        .unwrap();

    let data: PvPayload = serde_json::from_value(serde_json::json!({
        "type": "surveillance",
        "numBL": "BL-2-rev",
        "depotage": {
            "lot": [
                {"numLot": "L1", "bonEtat": 8, "manquant": 4, "avarie": 1},
                {"numLot": "L2", "bonEtat": "5", "manquant": 0, "avarie": 0}
            ]
        }
    }))
    .unwrap();
    let updated = service.update(&pv.id, &data, "user-1").await.unwrap();

    assert_eq!(updated.pv_type(), PvType::Depotage);
    assert_eq!(updated.common.num_bl, "BL-2-rev");
    let PvDetails::Depotage(details) = &updated.details else {
        panic!("type changed on update");
    };
    assert_eq!(details.num_pv, pv.details.number());
    assert_eq!(details.depotage.lot.len(), 2);
    assert_eq!(details.depotage.lot[1].bon_etat, 5);
}

#[tokio::test]
async fn update_missing_pv_fails() {
    let (service, _store) = setup().await;
    let err = service
        .update("ghost", &surveillance_payload(), "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PvNotFound));
}

#[tokio::test]
async fn update_appends_labelled_activity() {
    let (service, store) = setup().await;
    let pv = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();
    service
        .update(&pv.id, &surveillance_payload(), "user-1")
        .await
        .unwrap();

    let task = store.get_task("task-1").await.unwrap();
    assert_eq!(
        task.activities.last().unwrap().activity,
        "a mis à jour le PV: SURV-001"
    );
}

#[tokio::test]
async fn completion_toggles_both_ways_with_two_activities() {
    let (service, store) = setup().await;
    let pv = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();

    let done = service.set_completed(&pv.id, true, "user-1").await.unwrap();
    assert!(done.is_completed);
    let undone = service.set_completed(&pv.id, false, "user-1").await.unwrap();
    assert!(!undone.is_completed);

    let task = store.get_task("task-1").await.unwrap();
    // create + two toggles
    assert_eq!(task.activities.len(), 3);
    assert_eq!(
        task.activities[1].activity,
        "a marqué le PV SURV-001 comme terminé"
    );
    assert_eq!(
        task.activities[2].activity,
        "a marqué le PV SURV-001 comme non terminé"
    );
}

#[tokio::test]
async fn delete_unlinks_once_and_second_delete_fails() {
    let (service, store) = setup().await;
    let pv = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();

    service.delete(&pv.id, "user-1").await.unwrap();

    let task = store.get_task("task-1").await.unwrap();
    assert!(task.pvs.is_empty());
    assert_eq!(
        task.activities.last().unwrap().activity,
        "a supprimé le PV SURV-001"
    );
    let activities_after_delete = task.activities.len();

    let err = service.delete(&pv.id, "user-1").await.unwrap_err();
    assert!(matches!(err, ServiceError::PvNotFound));
    let task = store.get_task("task-1").await.unwrap();
    assert!(task.pvs.is_empty());
    assert_eq!(task.activities.len(), activities_after_delete);
}

#[tokio::test]
async fn deleted_number_is_never_reused() {
    let (service, _store) = setup().await;
    let pv = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();
    assert_eq!(pv.details.number(), 1);
    service.delete(&pv.id, "user-1").await.unwrap();

    let next = service
        .create("task-1", &surveillance_payload(), "user-1")
        .await
        .unwrap();
    assert_eq!(next.details.number(), 2);
}
