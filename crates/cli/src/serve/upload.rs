//! Multipart image upload and image detach handlers.
//!
//! Upload responses use the legacy `{success, message, imageUrls?}` shape
//! rather than the `{status, ...}` envelope of the PV routes.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use pvdesk_service::UploadedImage;

use super::handlers::service_error;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteImageBody {
    #[serde(rename = "pvId")]
    pub(crate) pv_id: String,
    #[serde(rename = "imageUrl")]
    pub(crate) image_url: String,
}

/// POST /upload/pv-images
///
/// Fields: `pvId` (text) and one `images` part per file. Files and the id
/// may arrive in any order; the whole form is read before the service call.
pub(crate) async fn handle_upload_images(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut pv_id: Option<String> = None;
    let mut files: Vec<UploadedImage> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return upload_error(
                    StatusCode::BAD_REQUEST,
                    format!("formulaire multipart invalide: {e}"),
                );
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pvId" => match field.text().await {
                Ok(text) => pv_id = Some(text),
                Err(e) => {
                    return upload_error(
                        StatusCode::BAD_REQUEST,
                        format!("champ pvId illisible: {e}"),
                    );
                }
            },
            "images" | "images[]" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => files.push(UploadedImage {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    }),
                    Err(e) => {
                        return upload_error(
                            StatusCode::BAD_REQUEST,
                            format!("fichier '{file_name}' illisible: {e}"),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    let Some(pv_id) = pv_id else {
        return upload_error(StatusCode::BAD_REQUEST, "le champ pvId est requis".to_string());
    };

    match state.images.add_images(&pv_id, files).await {
        Ok(refs) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Images téléchargées avec succès",
                "imageUrls": refs,
            })),
        )
            .into_response(),
        Err(e) => service_error(e, "success"),
    }
}

/// DELETE /upload/delete-image
pub(crate) async fn handle_delete_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeleteImageBody>,
) -> Response {
    match state.images.remove_image(&body.pv_id, &body.image_url).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Image supprimée avec succès",
            })),
        )
            .into_response(),
        Err(e) => service_error(e, "success"),
    }
}

fn upload_error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({"success": false, "message": message})),
    )
        .into_response()
}
