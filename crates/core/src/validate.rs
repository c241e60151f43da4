//! Create-time validation: per-type required-field checks.
//!
//! Validation runs before any counter increment or persistence, and reports
//! every missing field at once rather than failing on the first.

use thiserror::Error;

use crate::model::PvType;
use crate::payload::PvPayload;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("type de PV invalide ou manquant")]
    InvalidType,
    #[error("champs requis manquants: {}", missing.join(", "))]
    MissingFields { missing: Vec<&'static str> },
}

/// Validate a create payload for its declared type.
///
/// Returns the parsed [`PvType`] so callers never re-parse the raw string.
/// `dateIntervention`/`dateArrivee` are not checked here: absent dates
/// default to the creation instant.
pub fn validate_payload(data: &PvPayload) -> Result<PvType, ValidationError> {
    let kind = data
        .pv_type
        .as_deref()
        .and_then(PvType::parse)
        .ok_or(ValidationError::InvalidType)?;

    let mut missing = Vec::new();
    require(&mut missing, "numBL", &data.num_bl);
    require(&mut missing, "importateur", &data.importateur);
    require(&mut missing, "numTC", &data.num_tc);
    require(&mut missing, "numScelle", &data.num_scelle);
    if data.nb_colis.is_none() {
        missing.push("nbColis");
    }
    require(&mut missing, "navire", &data.navire);
    require(&mut missing, "portChargement", &data.port_chargement);
    require(&mut missing, "portDechargement", &data.port_dechargement);
    require(&mut missing, "grosArticle", &data.gros_article);

    match kind {
        PvType::Surveillance => {
            require(&mut missing, "numFacture", &data.num_facture);
            require(&mut missing, "transitaire", &data.transitaire);
            require(&mut missing, "lieuIntervention", &data.lieu_intervention);
            require(&mut missing, "natureMarchandise", &data.nature_marchandise);
        }
        PvType::Depotage => {
            let has_num_cde = data.depotage.as_ref().and_then(|d| d.num_cde).is_some();
            if !has_num_cde {
                missing.push("depotage.numCde");
            }
        }
    }

    if missing.is_empty() {
        Ok(kind)
    } else {
        Err(ValidationError::MissingFields { missing })
    }
}

fn require(missing: &mut Vec<&'static str>, name: &'static str, value: &Option<String>) {
    match value {
        Some(v) if !v.trim().is_empty() => {}
        _ => missing.push(name),
    }
}
