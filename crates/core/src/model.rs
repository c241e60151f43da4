//! PV record types: the tagged-union report model and its update semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::payload::PvPayload;

/// The two PV report subtypes. Fixed at creation, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PvType {
    Surveillance,
    Depotage,
}

impl PvType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PvType::Surveillance => "surveillance",
            PvType::Depotage => "depotage",
        }
    }

    pub fn parse(raw: &str) -> Option<PvType> {
        match raw {
            "surveillance" => Some(PvType::Surveillance),
            "depotage" => Some(PvType::Depotage),
            _ => None,
        }
    }

    /// Prefix used in human-facing sequence labels (`SURV-007`, `DEPO-012`).
    pub fn label_prefix(&self) -> &'static str {
        match self {
            PvType::Surveillance => "SURV",
            PvType::Depotage => "DEPO",
        }
    }

    /// French display name used in activity messages.
    pub fn display_fr(&self) -> &'static str {
        match self {
            PvType::Surveillance => "surveillance",
            PvType::Depotage => "dépotage",
        }
    }
}

impl fmt::Display for PvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields required for every PV regardless of subtype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvCommon {
    #[serde(rename = "numBL")]
    pub num_bl: String,
    pub importateur: String,
    #[serde(rename = "numTC")]
    pub num_tc: String,
    #[serde(rename = "numScelle")]
    pub num_scelle: String,
    #[serde(rename = "nbColis", deserialize_with = "coerce::count")]
    pub nb_colis: u32,
    pub navire: String,
    #[serde(rename = "portChargement")]
    pub port_chargement: String,
    #[serde(rename = "portDechargement")]
    pub port_dechargement: String,
    #[serde(rename = "grosArticle")]
    pub gros_article: String,
}

/// Surveillance sub-object: free-text findings plus attached image refs.
///
/// `Constation` keeps the legacy spelling — the client reads it verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveillanceBody {
    #[serde(rename = "Constation", default)]
    pub constation: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// One container entry on a dépotage report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conteneur {
    #[serde(rename = "numConteneur")]
    pub num_conteneur: String,
    #[serde(rename = "numScelle")]
    pub num_scelle: String,
    #[serde(deserialize_with = "coerce::count", default)]
    pub quantite: u32,
    #[serde(default)]
    pub nuance: String,
    pub conforme: bool,
}

/// One lot entry on a dépotage report: good/missing/damaged unit counts.
///
/// Counts arrive as numbers or strings and always store as non-negative
/// integers, defaulting to 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    #[serde(rename = "numLot", default)]
    pub num_lot: String,
    #[serde(rename = "bonEtat", deserialize_with = "coerce::count", default)]
    pub bon_etat: u32,
    #[serde(deserialize_with = "coerce::count", default)]
    pub manquant: u32,
    #[serde(deserialize_with = "coerce::count", default)]
    pub avarie: u32,
}

/// Dépotage sub-object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepotageBody {
    #[serde(rename = "numCde", deserialize_with = "coerce::count")]
    pub num_cde: u32,
    #[serde(rename = "lieuDepotage", default)]
    pub lieu_depotage: String,
    #[serde(default)]
    pub observations: String,
    #[serde(default)]
    pub produit: String,
    #[serde(default)]
    pub nuance: String,
    #[serde(deserialize_with = "coerce::count", default)]
    pub quantite: u32,
    #[serde(default)]
    pub conteneur: Vec<Conteneur>,
    #[serde(default)]
    pub lot: Vec<Lot>,
}

/// Surveillance-specific fields, including the counter-assigned number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveillanceDetails {
    #[serde(rename = "numPvSurveillance")]
    pub num_pv: u32,
    #[serde(rename = "numFacture")]
    pub num_facture: String,
    #[serde(rename = "dateIntervention")]
    pub date_intervention: String,
    pub transitaire: String,
    #[serde(rename = "lieuIntervention")]
    pub lieu_intervention: String,
    #[serde(rename = "natureMarchandise")]
    pub nature_marchandise: String,
    #[serde(rename = "dateArrivee")]
    pub date_arrivee: String,
    #[serde(default)]
    pub surveillance: SurveillanceBody,
}

/// Dépotage-specific fields, including the counter-assigned number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepotageDetails {
    #[serde(rename = "numPvDepotage")]
    pub num_pv: u32,
    pub depotage: DepotageBody,
}

/// Type-specific half of a PV record. The serde tag is the wire `type`
/// field, so exactly one of `numPvSurveillance`/`numPvDepotage` exists per
/// record by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PvDetails {
    Surveillance(SurveillanceDetails),
    Depotage(DepotageDetails),
}

impl PvDetails {
    pub fn pv_type(&self) -> PvType {
        match self {
            PvDetails::Surveillance(_) => PvType::Surveillance,
            PvDetails::Depotage(_) => PvType::Depotage,
        }
    }

    /// The counter-assigned sequence number for this record's subtype.
    pub fn number(&self) -> u32 {
        match self {
            PvDetails::Surveillance(d) => d.num_pv,
            PvDetails::Depotage(d) => d.num_pv,
        }
    }

    /// Human-facing label: type prefix + zero-padded 3-digit number.
    pub fn label(&self) -> String {
        format!("{}-{:03}", self.pv_type().label_prefix(), self.number())
    }
}

/// One persisted inspection report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "taskId")]
    pub task_id: String,
    #[serde(flatten)]
    pub common: PvCommon,
    #[serde(flatten)]
    pub details: PvDetails,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl PvRecord {
    pub fn pv_type(&self) -> PvType {
        self.details.pv_type()
    }

    pub fn label(&self) -> String {
        self.details.label()
    }

    /// Overwrite this record from an update payload.
    ///
    /// The subtype is immutable: surveillance payloads applied to a dépotage
    /// record (and vice versa) only touch the common fields. For dépotage,
    /// the `lot[]` array is replaced wholesale from the payload — each update
    /// submits the complete current set of lots. Attached images are never
    /// touched here; they belong to the image attachment operations.
    pub fn apply_update(&mut self, data: &PvPayload, now: &str) {
        let common = &mut self.common;
        overwrite(&mut common.num_bl, &data.num_bl);
        overwrite(&mut common.importateur, &data.importateur);
        overwrite(&mut common.num_tc, &data.num_tc);
        overwrite(&mut common.num_scelle, &data.num_scelle);
        if let Some(n) = data.nb_colis {
            common.nb_colis = n;
        }
        overwrite(&mut common.navire, &data.navire);
        overwrite(&mut common.port_chargement, &data.port_chargement);
        overwrite(&mut common.port_dechargement, &data.port_dechargement);
        overwrite(&mut common.gros_article, &data.gros_article);

        match &mut self.details {
            PvDetails::Surveillance(d) => {
                overwrite(&mut d.num_facture, &data.num_facture);
                overwrite(&mut d.date_intervention, &data.date_intervention);
                overwrite(&mut d.transitaire, &data.transitaire);
                overwrite(&mut d.lieu_intervention, &data.lieu_intervention);
                overwrite(&mut d.nature_marchandise, &data.nature_marchandise);
                overwrite(&mut d.date_arrivee, &data.date_arrivee);
                if let Some(s) = &data.surveillance {
                    if let Some(c) = &s.constation {
                        d.surveillance.constation = c.clone();
                    }
                }
            }
            PvDetails::Depotage(d) => {
                let body = &mut d.depotage;
                if let Some(dep) = &data.depotage {
                    if let Some(n) = dep.num_cde {
                        body.num_cde = n;
                    }
                    overwrite_nonempty(&mut body.lieu_depotage, &dep.lieu_depotage);
                    overwrite_nonempty(&mut body.observations, &dep.observations);
                    overwrite_nonempty(&mut body.produit, &dep.produit);
                    overwrite_nonempty(&mut body.nuance, &dep.nuance);
                    if let Some(q) = dep.quantite {
                        body.quantite = q;
                    }
                    // Full-replace contract: the payload carries the complete
                    // current set of lots.
                    body.lot = dep.lot.clone();
                }

                // Keep the first conteneur entry in sync with the seal/TC
                // fields, creating it if the list is still empty.
                let quantite = data
                    .depotage
                    .as_ref()
                    .and_then(|dep| dep.quantite)
                    .unwrap_or(body.quantite);
                let nuance = data
                    .depotage
                    .as_ref()
                    .and_then(|dep| dep.nuance.clone())
                    .unwrap_or_else(|| body.nuance.clone());
                if body.conteneur.is_empty() {
                    if let Some(num_tc) = &data.num_tc {
                        body.conteneur.push(Conteneur {
                            num_conteneur: num_tc.clone(),
                            num_scelle: data.num_scelle.clone().unwrap_or_default(),
                            quantite,
                            nuance,
                            conforme: true,
                        });
                    }
                } else {
                    let first = &mut body.conteneur[0];
                    overwrite(&mut first.num_conteneur, &data.num_tc);
                    overwrite(&mut first.num_scelle, &data.num_scelle);
                    first.quantite = quantite;
                    first.nuance = nuance;
                }
            }
        }

        self.updated_at = now.to_string();
    }
}

fn overwrite(target: &mut String, source: &Option<String>) {
    if let Some(v) = source {
        *target = v.clone();
    }
}

fn overwrite_nonempty(target: &mut String, source: &Option<String>) {
    if let Some(v) = source {
        if !v.is_empty() {
            *target = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{DepotagePayload, SurveillancePayload};

    fn common() -> PvCommon {
        PvCommon {
            num_bl: "BL-1".into(),
            importateur: "ACME".into(),
            num_tc: "TC-1".into(),
            num_scelle: "S-1".into(),
            nb_colis: 10,
            navire: "MV Test".into(),
            port_chargement: "Shanghai".into(),
            port_dechargement: "Douala".into(),
            gros_article: "tubes".into(),
        }
    }

    fn surveillance_record() -> PvRecord {
        PvRecord {
            id: "pv-1".into(),
            task_id: "task-1".into(),
            common: common(),
            details: PvDetails::Surveillance(SurveillanceDetails {
                num_pv: 7,
                num_facture: "F-1".into(),
                date_intervention: "2025-01-01T00:00:00Z".into(),
                transitaire: "T".into(),
                lieu_intervention: "Port".into(),
                nature_marchandise: "acier".into(),
                date_arrivee: "2025-01-01T00:00:00Z".into(),
                surveillance: SurveillanceBody {
                    constation: "RAS".into(),
                    images: vec!["/uploads/images/a.jpg".into()],
                },
            }),
            created_by: "user-1".into(),
            is_completed: false,
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    fn depotage_record() -> PvRecord {
        PvRecord {
            id: "pv-2".into(),
            task_id: "task-1".into(),
            common: common(),
            details: PvDetails::Depotage(DepotageDetails {
                num_pv: 12,
                depotage: DepotageBody {
                    num_cde: 42,
                    lieu_depotage: "Magasin 3".into(),
                    observations: String::new(),
                    produit: "fer".into(),
                    nuance: "A".into(),
                    quantite: 100,
                    conteneur: vec![],
                    lot: vec![Lot {
                        num_lot: "L0".into(),
                        bon_etat: 5,
                        manquant: 0,
                        avarie: 0,
                    }],
                },
            }),
            created_by: "user-1".into(),
            is_completed: false,
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn label_is_zero_padded() {
        assert_eq!(surveillance_record().label(), "SURV-007");
        assert_eq!(depotage_record().label(), "DEPO-012");
    }

    #[test]
    fn serializes_with_legacy_wire_names() {
        let v = serde_json::to_value(surveillance_record()).unwrap();
        assert_eq!(v["type"], "surveillance");
        assert_eq!(v["numPvSurveillance"], 7);
        assert_eq!(v["numBL"], "BL-1");
        assert_eq!(v["surveillance"]["Constation"], "RAS");
        assert!(v.get("numPvDepotage").is_none());

        let v = serde_json::to_value(depotage_record()).unwrap();
        assert_eq!(v["type"], "depotage");
        assert_eq!(v["numPvDepotage"], 12);
        assert_eq!(v["depotage"]["numCde"], 42);
        assert!(v.get("numPvSurveillance").is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let rec = depotage_record();
        let v = serde_json::to_value(&rec).unwrap();
        let back: PvRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back.pv_type(), PvType::Depotage);
        assert_eq!(back.details.number(), 12);
        assert_eq!(back.common.nb_colis, 10);
    }

    #[test]
    fn update_replaces_lots_wholesale() {
        let mut rec = depotage_record();
        let data = PvPayload {
            depotage: Some(DepotagePayload {
                lot: vec![
                    Lot {
                        num_lot: "L1".into(),
                        bon_etat: 10,
                        manquant: 2,
                        avarie: 1,
                    },
                    Lot {
                        num_lot: "L2".into(),
                        bon_etat: 3,
                        manquant: 0,
                        avarie: 0,
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        rec.apply_update(&data, "2025-02-01T00:00:00Z");
        let PvDetails::Depotage(d) = &rec.details else {
            panic!("type changed");
        };
        assert_eq!(d.depotage.lot.len(), 2);
        assert_eq!(d.depotage.lot[0].num_lot, "L1");
        assert_eq!(d.depotage.lot[1].bon_etat, 3);
        assert_eq!(rec.updated_at, "2025-02-01T00:00:00Z");
    }

    #[test]
    fn update_seeds_conteneur_from_tc_fields() {
        let mut rec = depotage_record();
        let data = PvPayload {
            num_tc: Some("TC-9".into()),
            num_scelle: Some("S-9".into()),
            ..Default::default()
        };
        rec.apply_update(&data, "2025-02-01T00:00:00Z");
        let PvDetails::Depotage(d) = &rec.details else {
            panic!("type changed");
        };
        assert_eq!(d.depotage.conteneur.len(), 1);
        assert_eq!(d.depotage.conteneur[0].num_conteneur, "TC-9");
        assert!(d.depotage.conteneur[0].conforme);
    }

    #[test]
    fn update_never_touches_images_or_type() {
        let mut rec = surveillance_record();
        let data = PvPayload {
            pv_type: Some("depotage".into()),
            surveillance: Some(SurveillancePayload {
                constation: Some("dommages visibles".into()),
            }),
            ..Default::default()
        };
        rec.apply_update(&data, "2025-02-01T00:00:00Z");
        assert_eq!(rec.pv_type(), PvType::Surveillance);
        let PvDetails::Surveillance(d) = &rec.details else {
            panic!("type changed");
        };
        assert_eq!(d.surveillance.constation, "dommages visibles");
        assert_eq!(d.surveillance.images.len(), 1);
        assert_eq!(d.num_pv, 7);
    }
}
