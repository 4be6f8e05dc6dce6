use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tower_sessions::Session;
use crate::AppState;

pub const AUTH_SESSION_KEY: &str = "authenticated";

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    // If no password is set, authentication is disabled
    if state.config.app_password.is_none() {
        return next.run(request).await;
    }

    let authenticated: bool = session
        .get(AUTH_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or(false);

    if authenticated {
        next.run(request).await
    } else {
        tracing::debug!("Rejecting unauthenticated request to {}", request.uri());
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response()
    }
}
