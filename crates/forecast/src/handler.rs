use crate::calculator::Forecast;
use crate::service::{ForecastError, ForecastService};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for ForecastError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ForecastError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ForecastError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Forecast failed".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn forecast_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_forecast))
        .with_state(state)
}

async fn get_forecast(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Forecast>, ForecastError> {
    let today = chrono::Local::now().date_naive();
    let forecast = ForecastService::month_to_date(&state.db, today).await.map_err(|e| {
        tracing::error!("get_forecast error: {:?}", e);
        e
    })?;
    Ok(Json(forecast))
}
