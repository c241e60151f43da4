//! Inbound payload shapes for create and update.
//!
//! The client submits one loosely-typed `data` object for both subtypes;
//! everything is optional here and [`crate::validate_payload`] decides what
//! is actually required for the declared type. Numeric scalars accept both
//! JSON numbers and strings.

use serde::Deserialize;

use crate::coerce;
use crate::model::Lot;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PvPayload {
    #[serde(rename = "type")]
    pub pv_type: Option<String>,
    #[serde(rename = "numBL")]
    pub num_bl: Option<String>,
    pub importateur: Option<String>,
    #[serde(rename = "numTC")]
    pub num_tc: Option<String>,
    #[serde(rename = "numScelle")]
    pub num_scelle: Option<String>,
    #[serde(rename = "nbColis", deserialize_with = "coerce::opt_count", default)]
    pub nb_colis: Option<u32>,
    pub navire: Option<String>,
    #[serde(rename = "portChargement")]
    pub port_chargement: Option<String>,
    #[serde(rename = "portDechargement")]
    pub port_dechargement: Option<String>,
    #[serde(rename = "grosArticle")]
    pub gros_article: Option<String>,

    // Surveillance-only scalars.
    #[serde(rename = "numFacture")]
    pub num_facture: Option<String>,
    #[serde(rename = "dateIntervention")]
    pub date_intervention: Option<String>,
    pub transitaire: Option<String>,
    #[serde(rename = "lieuIntervention")]
    pub lieu_intervention: Option<String>,
    #[serde(rename = "natureMarchandise")]
    pub nature_marchandise: Option<String>,
    #[serde(rename = "dateArrivee")]
    pub date_arrivee: Option<String>,

    // Dépotage creations may pass the location at top level.
    #[serde(rename = "lieuDepotage")]
    pub lieu_depotage: Option<String>,

    pub surveillance: Option<SurveillancePayload>,
    pub depotage: Option<DepotagePayload>,

    /// Older clients send the findings text at top level.
    pub constatations: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveillancePayload {
    #[serde(rename = "Constation")]
    pub constation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepotagePayload {
    #[serde(rename = "numCde", deserialize_with = "coerce::opt_count", default)]
    pub num_cde: Option<u32>,
    #[serde(rename = "lieuDepotage")]
    pub lieu_depotage: Option<String>,
    pub observations: Option<String>,
    pub produit: Option<String>,
    pub nuance: Option<String>,
    #[serde(deserialize_with = "coerce::opt_count", default)]
    pub quantite: Option<u32>,
    /// Absent and empty are equivalent: the stored set becomes empty.
    #[serde(default)]
    pub lot: Vec<Lot>,
}

impl PvPayload {
    /// Findings text for a surveillance PV, wherever the client put it.
    pub fn constation(&self) -> String {
        self.surveillance
            .as_ref()
            .and_then(|s| s.constation.clone())
            .or_else(|| self.constatations.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lot_counts_coerce_from_strings() {
        let data: PvPayload = serde_json::from_value(serde_json::json!({
            "type": "depotage",
            "depotage": {
                "numCde": "42",
                "lot": [{"numLot": "L1", "bonEtat": "10", "manquant": "2", "avarie": "1"}]
            }
        }))
        .unwrap();
        let dep = data.depotage.unwrap();
        assert_eq!(dep.num_cde, Some(42));
        assert_eq!(dep.lot[0].bon_etat, 10);
        assert_eq!(dep.lot[0].manquant, 2);
        assert_eq!(dep.lot[0].avarie, 1);
    }

    #[test]
    fn constation_falls_back_to_top_level() {
        let data: PvPayload = serde_json::from_value(serde_json::json!({
            "type": "surveillance",
            "constatations": "cargaison conforme"
        }))
        .unwrap();
        assert_eq!(data.constation(), "cargaison conforme");

        let data: PvPayload = serde_json::from_value(serde_json::json!({
            "type": "surveillance",
            "surveillance": {"Constation": "avarie sur 3 colis"},
            "constatations": "ignored"
        }))
        .unwrap();
        assert_eq!(data.constation(), "avarie sur 3 colis");
    }
}
