use crate::calculator::{InsightWindow, Insights};
use crate::service::{InsightsError, InsightsService};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::AppState;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for InsightsError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            InsightsError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            InsightsError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    pub date: Option<String>,  // YYYY-MM-DD, defaults to today
    pub scope: Option<String>, // day | month | all
}

impl InsightsQuery {
    fn window(&self, today: chrono::NaiveDate) -> Result<InsightWindow, InsightsError> {
        let date = match self.date.as_deref() {
            Some(raw) => common::calendar::parse_day(raw).ok_or_else(|| {
                InsightsError::InvalidInput("Invalid date, expected YYYY-MM-DD".into())
            })?,
            None => today,
        };

        match self.scope.as_deref().unwrap_or("day") {
            "day" => Ok(InsightWindow::Day { date }),
            "month" => Ok(InsightWindow::Month {
                month: common::calendar::month_key(date),
            }),
            "all" => Ok(InsightWindow::All),
            other => Err(InsightsError::InvalidInput(format!(
                "Unknown scope '{}', expected day, month or all",
                other
            ))),
        }
    }
}

pub fn insights_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_insights))
        .with_state(state)
}

async fn get_insights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<Insights>, InsightsError> {
    let today = chrono::Local::now().date_naive();
    let window = query.window(today)?;

    let insights = InsightsService::compute(&state.db, today, window).await.map_err(|e| {
        tracing::error!("get_insights error: {:?}", e);
        e
    })?;
    Ok(Json(insights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn query(date: Option<&str>, scope: Option<&str>) -> InsightsQuery {
        InsightsQuery {
            date: date.map(str::to_string),
            scope: scope.map(str::to_string),
        }
    }

    #[test]
    fn test_window_defaults_to_today() {
        assert_eq!(query(None, None).window(today()).unwrap(), InsightWindow::Day { date: today() });
    }

    #[test]
    fn test_window_scopes() {
        assert_eq!(
            query(Some("2026-09-03"), Some("month")).window(today()).unwrap(),
            InsightWindow::Month { month: "2026-09".into() }
        );
        assert_eq!(query(None, Some("all")).window(today()).unwrap(), InsightWindow::All);
    }

    #[test]
    fn test_window_rejects_garbage() {
        assert!(matches!(
            query(Some("03/09/2026"), None).window(today()),
            Err(InsightsError::InvalidInput(_))
        ));
        assert!(matches!(
            query(None, Some("week")).window(today()),
            Err(InsightsError::InvalidInput(_))
        ));
    }
}
