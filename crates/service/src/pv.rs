//! PV lifecycle operations.

use std::sync::Arc;

use pvdesk_core::{
    validate_payload, Conteneur, DepotageBody, DepotageDetails, PvCommon, PvDetails, PvPayload,
    PvRecord, PvType, SurveillanceBody, SurveillanceDetails,
};
use pvdesk_storage::{ActivityRecord, PvStorage, UserRecord};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::now_rfc3339;

/// A PV record with its author resolved for display.
#[derive(Debug, Clone)]
pub struct PvView {
    pub record: PvRecord,
    pub author: Option<UserRecord>,
}

impl PvView {
    /// Response-shape JSON: the record with `createdBy` expanded to
    /// `{_id, name, email}`. A missing author degrades to `{_id}` only.
    pub fn into_value(self) -> serde_json::Value {
        let created_by = match &self.author {
            Some(user) => serde_json::json!({
                "_id": user.id,
                "name": user.name,
                "email": user.email,
            }),
            None => serde_json::json!({ "_id": self.record.created_by }),
        };
        let mut value = serde_json::to_value(&self.record)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("createdBy".to_string(), created_by);
        }
        value
    }
}

/// Lifecycle service: create, list, fetch, update, completion toggle, delete.
///
/// Every mutating operation appends an activity entry to the owning task.
/// Activity and link updates after a successful persist are best-effort:
/// a failure there is logged, never silently dropping the persisted PV.
pub struct PvService<S> {
    store: Arc<S>,
}

impl<S> Clone for PvService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: PvStorage> PvService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create a PV under a task.
    ///
    /// Order matters: task lookup, then payload validation, and only then
    /// the counter increment — a rejected payload must leave the counter
    /// untouched. A counter or persist failure aborts with no record.
    pub async fn create(
        &self,
        task_id: &str,
        data: &PvPayload,
        author_id: &str,
    ) -> Result<PvRecord, ServiceError> {
        self.store.get_task(task_id).await?;
        let kind = validate_payload(data)?;

        let seq = self.store.next_sequence(kind).await?;
        let now = now_rfc3339();
        let record = build_record(task_id, data, kind, seq, author_id, &now);
        self.store.insert_pv(record.clone()).await?;

        if let Err(e) = self.store.link_pv(task_id, &record.id).await {
            eprintln!("warning: PV {} created but not linked to task {task_id}: {e}", record.id);
        }
        self.log_activity(
            task_id,
            format!("a créé un PV de {}", kind.display_fr()),
            author_id,
            &now,
        )
        .await;

        Ok(record)
    }

    /// All PVs for a task, newest-first, authors resolved.
    pub async fn pvs_by_task(&self, task_id: &str) -> Result<Vec<PvView>, ServiceError> {
        let mut records = self.store.list_pvs_by_task(task_id).await?;
        // RFC 3339 strings sort chronologically.
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let author = self.store.get_user(&record.created_by).await.ok();
            views.push(PvView { record, author });
        }
        Ok(views)
    }

    /// One PV with its author resolved.
    pub async fn pv_by_id(&self, id: &str) -> Result<PvView, ServiceError> {
        let record = self.store.get_pv(id).await?;
        let author = self.store.get_user(&record.created_by).await.ok();
        Ok(PvView { record, author })
    }

    /// Overwrite a PV from an update payload. The subtype and its sequence
    /// number are immutable; for dépotage the lot set is replaced wholesale.
    pub async fn update(
        &self,
        id: &str,
        data: &PvPayload,
        author_id: &str,
    ) -> Result<PvRecord, ServiceError> {
        let mut record = self.store.get_pv(id).await?;
        let now = now_rfc3339();
        record.apply_update(data, &now);
        self.store.update_pv(record.clone()).await?;

        self.log_activity(
            &record.task_id,
            format!("a mis à jour le PV: {}", record.label()),
            author_id,
            &now,
        )
        .await;

        Ok(record)
    }

    /// Toggle `isCompleted`, both directions.
    pub async fn set_completed(
        &self,
        id: &str,
        is_completed: bool,
        author_id: &str,
    ) -> Result<PvRecord, ServiceError> {
        let mut record = self.store.get_pv(id).await?;
        let now = now_rfc3339();
        record.is_completed = is_completed;
        record.updated_at = now.clone();
        self.store.update_pv(record.clone()).await?;

        let state = if is_completed { "terminé" } else { "non terminé" };
        self.log_activity(
            &record.task_id,
            format!("a marqué le PV {} comme {state}", record.label()),
            author_id,
            &now,
        )
        .await;

        Ok(record)
    }

    /// Delete a PV. The task is unlinked before the physical delete so a
    /// retried call never leaves the task referencing a dead id. The
    /// sequence number is never reused.
    pub async fn delete(&self, id: &str, author_id: &str) -> Result<(), ServiceError> {
        let record = self.store.get_pv(id).await?;

        match self.store.unlink_pv(&record.task_id, id).await {
            Ok(()) | Err(pvdesk_storage::StorageError::TaskNotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let now = now_rfc3339();
        self.log_activity(
            &record.task_id,
            format!("a supprimé le PV {}", record.label()),
            author_id,
            &now,
        )
        .await;

        self.store.delete_pv(id).await?;
        Ok(())
    }

    async fn log_activity(&self, task_id: &str, activity: String, author_id: &str, now: &str) {
        let entry = ActivityRecord::commented(activity, author_id, now);
        if let Err(e) = self.store.append_activity(task_id, entry).await {
            eprintln!("warning: activity not recorded on task {task_id}: {e}");
        }
    }
}

/// Build a fresh record from a validated create payload.
fn build_record(
    task_id: &str,
    data: &PvPayload,
    kind: PvType,
    seq: u32,
    author_id: &str,
    now: &str,
) -> PvRecord {
    let common = PvCommon {
        num_bl: data.num_bl.clone().unwrap_or_default(),
        importateur: data.importateur.clone().unwrap_or_default(),
        num_tc: data.num_tc.clone().unwrap_or_default(),
        num_scelle: data.num_scelle.clone().unwrap_or_default(),
        nb_colis: data.nb_colis.unwrap_or_default(),
        navire: data.navire.clone().unwrap_or_default(),
        port_chargement: data.port_chargement.clone().unwrap_or_default(),
        port_dechargement: data.port_dechargement.clone().unwrap_or_default(),
        gros_article: data.gros_article.clone().unwrap_or_default(),
    };

    let details = match kind {
        PvType::Surveillance => PvDetails::Surveillance(SurveillanceDetails {
            num_pv: seq,
            num_facture: data.num_facture.clone().unwrap_or_default(),
            // Absent dates default to the creation instant.
            date_intervention: data.date_intervention.clone().unwrap_or_else(|| now.to_string()),
            transitaire: data.transitaire.clone().unwrap_or_default(),
            lieu_intervention: data.lieu_intervention.clone().unwrap_or_default(),
            nature_marchandise: data.nature_marchandise.clone().unwrap_or_default(),
            date_arrivee: data.date_arrivee.clone().unwrap_or_else(|| now.to_string()),
            surveillance: SurveillanceBody {
                constation: data.constation(),
                images: Vec::new(),
            },
        }),
        PvType::Depotage => {
            let dep = data.depotage.as_ref();
            let quantite = dep.and_then(|d| d.quantite).unwrap_or(0);
            let nuance = dep.and_then(|d| d.nuance.clone()).unwrap_or_default();
            let mut body = DepotageBody {
                num_cde: dep.and_then(|d| d.num_cde).unwrap_or(0),
                lieu_depotage: dep
                    .and_then(|d| d.lieu_depotage.clone())
                    .or_else(|| data.lieu_depotage.clone())
                    .unwrap_or_default(),
                observations: dep.and_then(|d| d.observations.clone()).unwrap_or_default(),
                produit: dep.and_then(|d| d.produit.clone()).unwrap_or_default(),
                nuance: nuance.clone(),
                quantite,
                conteneur: Vec::new(),
                lot: dep.map(|d| d.lot.clone()).unwrap_or_default(),
            };
            if let Some(num_tc) = &data.num_tc {
                body.conteneur.push(Conteneur {
                    num_conteneur: num_tc.clone(),
                    num_scelle: data.num_scelle.clone().unwrap_or_default(),
                    quantite,
                    nuance,
                    conforme: true,
                });
            }
            PvDetails::Depotage(DepotageDetails { num_pv: seq, depotage: body })
        }
    };

    PvRecord {
        id: Uuid::new_v4().to_string(),
        task_id: task_id.to_string(),
        common,
        details,
        created_by: author_id.to_string(),
        is_completed: false,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}
