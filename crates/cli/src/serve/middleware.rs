//! HTTP middleware: rate limiting and session authentication.

use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::state::{AppState, AuthUser};

/// Rate limiting middleware. Checks per-IP request rate before routing.
pub(crate) async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ip = addr.ip();
    match state.rate_limiter.check(ip).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            let body = serde_json::json!({
                "status": false,
                "message": "rate limit exceeded",
                "retry_after": retry_after,
            });
            (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
        }
    }
}

/// Session authentication middleware.
///
/// Every API request must carry a known session token via
/// `Authorization: Bearer <token>` or `X-Session-Token: <token>`; the
/// resolved user id becomes the request's [`AuthUser`] extension.
/// `/health` and the static `/uploads` tree are exempt.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if path == "/health" || path.starts_with("/uploads/") {
        return next.run(request).await;
    }

    let token = bearer_token(&request).or_else(|| header_token(&request));

    match token {
        Some(token) => match state.sessions.get(token) {
            Some(user_id) => {
                let user = AuthUser(user_id.clone());
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            None => error_response(StatusCode::FORBIDDEN, "session invalide"),
        },
        None => error_response(StatusCode::UNAUTHORIZED, "authentification requise"),
    }
}

fn bearer_token<'a>(request: &'a Request<axum::body::Body>) -> Option<&'a str> {
    request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
}

fn header_token<'a>(request: &'a Request<axum::body::Body>) -> Option<&'a str> {
    request
        .headers()
        .get("x-session-token")
        .and_then(|v| v.to_str().ok())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({"status": false, "message": message})),
    )
        .into_response()
}
