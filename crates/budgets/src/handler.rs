use crate::models::RawSetBudgetRequest;
use crate::service::{BudgetError, BudgetService};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for BudgetError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            BudgetError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            BudgetError::NotFound => (StatusCode::NOT_FOUND, "Budget not found".to_string()),
            BudgetError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn budget_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(set_budget))
        .route("/current", get(get_current_budget))
        .with_state(state)
}

fn current_month() -> String {
    common::calendar::month_key(chrono::Local::now().date_naive())
}

async fn get_current_budget(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, BudgetError> {
    let overview = BudgetService::overview(&state.db, &current_month()).await.map_err(|e| {
        tracing::error!("get_current_budget error: {:?}", e);
        e
    })?;
    Ok(Json(overview))
}

async fn set_budget(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawSetBudgetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BudgetError> {
    // Non-numeric amounts fail deserialization; report them like any other bad amount.
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!("Rejected budget payload: {}", e.body_text());
        BudgetError::InvalidInput("Budget amount must be a positive number".into())
    })?;

    let budget = BudgetService::set_budget(&state.db, current_month(), payload).await?;

    Ok(Json(json!({
        "message": "Budget saved successfully",
        "budget": budget,
    })))
}
