//! PV route handlers: create, list, fetch, update, complete, delete.
//!
//! Responses keep the legacy envelope: `{status: bool, message?, pv|pvs?}`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use pvdesk_core::PvPayload;
use pvdesk_service::{PvView, ServiceError};

use super::state::{AppState, AuthUser};

/// Request envelope: the client wraps the PV fields in a `data` object.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope {
    pub(crate) data: PvPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteBody {
    #[serde(rename = "isCompleted")]
    pub(crate) is_completed: bool,
}

/// Map a service error onto the legacy error envelope. Backend failures are
/// reported generically and logged server-side.
pub(crate) fn service_error(err: ServiceError, key: &'static str) -> Response {
    let status = match &err {
        ServiceError::TaskNotFound | ServiceError::PvNotFound => StatusCode::NOT_FOUND,
        ServiceError::Validation(_)
        | ServiceError::NotSurveillance
        | ServiceError::ImageNotFound
        | ServiceError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
        ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = if err.is_client_error() {
        err.to_string()
    } else {
        eprintln!("server error: {err}");
        "Erreur interne du serveur".to_string()
    };
    (
        status,
        Json(serde_json::json!({key: false, "message": message})),
    )
        .into_response()
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"status": false, "message": "not found"})),
    )
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// POST /pv/task/{taskId}
pub(crate) async fn handle_create_pv(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<DataEnvelope>,
) -> Response {
    match state.pv.create(&task_id, &body.data, &user_id).await {
        Ok(pv) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "status": true,
                "message": format!("PV de {} créé avec succès", pv.pv_type().display_fr()),
                "pv": pv,
            })),
        )
            .into_response(),
        Err(e) => service_error(e, "status"),
    }
}

/// GET /pv/task/{taskId}
pub(crate) async fn handle_list_pvs(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Response {
    match state.pv.pvs_by_task(&task_id).await {
        Ok(views) => {
            let pvs: Vec<serde_json::Value> =
                views.into_iter().map(PvView::into_value).collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({"status": true, "pvs": pvs})),
            )
                .into_response()
        }
        Err(e) => service_error(e, "status"),
    }
}

/// GET /pv/{id}
pub(crate) async fn handle_get_pv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.pv.pv_by_id(&id).await {
        Ok(view) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": true, "pv": view.into_value()})),
        )
            .into_response(),
        Err(e) => service_error(e, "status"),
    }
}

/// PUT /pv/{id}
pub(crate) async fn handle_update_pv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<DataEnvelope>,
) -> Response {
    match state.pv.update(&id, &body.data, &user_id).await {
        Ok(pv) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": true,
                "message": "PV mis à jour avec succès",
                "pv": pv,
            })),
        )
            .into_response(),
        Err(e) => service_error(e, "status"),
    }
}

/// PATCH /pv/{id}/complete
pub(crate) async fn handle_complete_pv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<CompleteBody>,
) -> Response {
    match state.pv.set_completed(&id, body.is_completed, &user_id).await {
        Ok(pv) => {
            let message = if pv.is_completed {
                "PV marqué comme terminé"
            } else {
                "PV marqué comme non terminé"
            };
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": true,
                    "message": message,
                    "isCompleted": pv.is_completed,
                })),
            )
                .into_response()
        }
        Err(e) => service_error(e, "status"),
    }
}

/// DELETE /pv/{id}
pub(crate) async fn handle_delete_pv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    match state.pv.delete(&id, &user_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": true,
                "message": "PV supprimé avec succès",
            })),
        )
            .into_response(),
        Err(e) => service_error(e, "status"),
    }
}
