//! Domain model for PV (procès-verbal) inspection reports.
//!
//! A PV is one of two report subtypes: *surveillance* (cargo surveillance,
//! supports attached images) or *dépotage* (container unloading, tracks
//! per-lot damage/shortage counts). The subtype is fixed at creation and
//! carries its own sequence number, so the model is a tagged union rather
//! than one loose struct with conditionally-required fields.
//!
//! Wire field names (`numBL`, `numPvSurveillance`, `Constation`, ...) match
//! the legacy client exactly.

mod coerce;
mod model;
mod payload;
mod validate;

pub use model::{
    Conteneur, DepotageBody, DepotageDetails, Lot, PvCommon, PvDetails, PvRecord, PvType,
    SurveillanceBody, SurveillanceDetails,
};
pub use payload::{DepotagePayload, PvPayload, SurveillancePayload};
pub use validate::{validate_payload, ValidationError};
