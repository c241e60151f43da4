//! `pvdesk serve` -- HTTP JSON API for PV inspection reports.
//!
//! Exposes the PV lifecycle and image attachment services as an async HTTP
//! service using `axum` + `tokio`. Supports concurrent request handling.
//!
//! Security features:
//! - Session-token authentication resolving a user id (seed file /
//!   PVDESK_SESSION_TOKENS)
//! - Per-IP rate limiting (default: 120 req/min, PVDESK_RATE_LIMIT override)
//! - CORS headers on all responses (permissive for local dev)
//! - Server-side upload validation (content-type, per-file size)
//!
//! Endpoints:
//! - GET    /health                - Server status (exempt from auth)
//! - POST   /pv/task/{taskId}      - Create a PV under a task
//! - GET    /pv/task/{taskId}      - List PVs for a task
//! - GET    /pv/{id}               - Fetch one PV
//! - PUT    /pv/{id}               - Update a PV
//! - PATCH  /pv/{id}/complete      - Toggle completion
//! - DELETE /pv/{id}               - Delete a PV
//! - POST   /upload/pv-images      - Attach images (multipart)
//! - DELETE /upload/delete-image   - Detach one image
//! - GET    /uploads/...           - Stored media (exempt from auth)
//!
//! All API responses use Content-Type: application/json.

mod handlers;
mod middleware;
mod state;
mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{delete, get, patch, post, put};
use axum::{middleware as axum_middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use pvdesk_service::{ImageService, ImageStore, PvService};
use pvdesk_storage::MemoryStorage;

use self::handlers::{
    handle_complete_pv, handle_create_pv, handle_delete_pv, handle_get_pv, handle_health,
    handle_list_pvs, handle_not_found, handle_update_pv,
};
use self::middleware::{auth_middleware, rate_limit_middleware};
use self::state::{AppState, RateLimiter};
use self::upload::{handle_delete_image, handle_upload_images};

/// Maximum request body size: 64 MB, above the 10-files x 5 MB upload cap.
const MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Default rate limit: 120 requests per minute per IP.
const DEFAULT_RATE_LIMIT: u64 = 120;

/// Rate limit window duration in seconds (1 minute).
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Start the HTTP server on the given port.
///
/// `media_dir` holds uploaded files and is served back under `/uploads`.
/// `seed` optionally pre-loads users (with session tokens) and tasks.
pub async fn start_server(
    port: u16,
    media_dir: PathBuf,
    seed: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStorage::new());

    let mut sessions = match &seed {
        Some(path) => crate::seed::load(path.as_path(), store.as_ref()).await?,
        None => Default::default(),
    };
    crate::seed::sessions_from_env(&mut sessions);
    if sessions.is_empty() {
        eprintln!("Warning: no session tokens configured; all API requests will be rejected");
    }

    let image_store = Arc::new(ImageStore::open(&media_dir)?);

    // Rate limit: from PVDESK_RATE_LIMIT env var, or default
    let rate_limit = std::env::var("PVDESK_RATE_LIMIT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT);
    eprintln!("Rate limit: {rate_limit} requests per minute per IP");

    let state = Arc::new(AppState {
        pv: PvService::new(store.clone()),
        images: ImageService::new(store, image_store),
        rate_limiter: RateLimiter::new(rate_limit),
        sessions,
    });

    // CORS: permissive for local dev.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/pv/task/{task_id}", post(handle_create_pv))
        .route("/pv/task/{task_id}", get(handle_list_pvs))
        .route("/pv/{id}", get(handle_get_pv))
        .route("/pv/{id}", put(handle_update_pv))
        .route("/pv/{id}/complete", patch(handle_complete_pv))
        .route("/pv/{id}", delete(handle_delete_pv))
        .route("/upload/pv-images", post(handle_upload_images))
        .route("/upload/delete-image", delete(handle_delete_image))
        .nest_service("/uploads", ServeDir::new(&media_dir))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("pvdesk listening on http://{addr} (media: {})", media_dir.display());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    eprintln!("\nReceived shutdown signal...");
}
