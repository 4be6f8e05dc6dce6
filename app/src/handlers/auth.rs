use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{AppState, auth::AUTH_SESSION_KEY};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Response {
    let Some(correct_password) = &state.config.app_password else {
        return Json(json!({ "message": "Authentication is disabled" })).into_response();
    };

    if payload.password != *correct_password {
        tracing::warn!("Failed login attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid password" })),
        )
            .into_response();
    }

    if let Err(e) = session.insert(AUTH_SESSION_KEY, true).await {
        tracing::error!("Failed to store session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response();
    }

    Json(json!({ "message": "Logged in" })).into_response()
}

pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to clear session: {}", e);
    }
    StatusCode::NO_CONTENT.into_response()
}
