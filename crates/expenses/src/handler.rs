use crate::models::{Expense, MonthlySummary, RawCreateExpenseRequest, SpendingTotals};
use crate::service::{ExpenseError, ExpenseService};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::AppState;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ExpenseError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ExpenseError::NotFound => (StatusCode::NOT_FOUND, "Expense not found".to_string()),
            ExpenseError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct ByDateQuery {
    pub date: Option<String>, // YYYY-MM-DD
}

pub fn expenses_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        // Specific routes first
        .route("/", get(list_expenses).post(create_expense))
        .route("/today", get(list_today))
        .route("/by-date", get(list_by_date))
        .route("/monthly", get(list_monthly_summaries))
        .route("/summary", get(get_spending_totals))
        // Then parameterized routes
        .route("/{id}", get(get_expense).delete(delete_expense))
        .with_state(state)
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawCreateExpenseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ExpenseError> {
    let Json(payload) = payload.map_err(|e| ExpenseError::InvalidInput(e.body_text()))?;
    let now = chrono::Local::now().naive_local();

    let expense = ExpenseService::add_expense(&state.db, payload, now).await.map_err(|e| {
        tracing::error!("create_expense error: {:?}", e);
        e
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expense added successfully",
            "expense": expense,
        })),
    ))
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Expense>>, ExpenseError> {
    let expenses = ExpenseService::list_expenses(&state.db).await?;
    Ok(Json(expenses))
}

async fn list_today(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Expense>>, ExpenseError> {
    let today = chrono::Local::now().date_naive();
    let expenses = ExpenseService::list_for_day(&state.db, today).await?;
    Ok(Json(expenses))
}

async fn list_by_date(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ByDateQuery>,
) -> Result<Json<Vec<Expense>>, ExpenseError> {
    let day = query
        .date
        .as_deref()
        .and_then(common::calendar::parse_day)
        .ok_or_else(|| ExpenseError::InvalidInput("Date query is required (YYYY-MM-DD)".into()))?;

    tracing::info!("Fetching expenses for: {}", day);
    let expenses = ExpenseService::list_for_day(&state.db, day).await?;
    Ok(Json(expenses))
}

async fn list_monthly_summaries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MonthlySummary>>, ExpenseError> {
    let summaries = ExpenseService::list_monthly_summaries(&state.db).await.map_err(|e| {
        tracing::error!("list_monthly_summaries error: {:?}", e);
        e
    })?;
    Ok(Json(summaries))
}

async fn get_spending_totals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SpendingTotals>, ExpenseError> {
    let totals = ExpenseService::spending_totals(&state.db).await?;
    Ok(Json(totals))
}

async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, ExpenseError> {
    let expense = ExpenseService::get_expense(&state.db, id).await?;
    Ok(Json(expense))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ExpenseError> {
    ExpenseService::delete_expense(&state.db, id).await.map_err(|e| {
        if !matches!(e, ExpenseError::NotFound) {
            tracing::error!("delete_expense error: {:?}", e);
        }
        e
    })?;

    Ok(Json(json!({ "message": "Expense deleted and monthly summary updated" })))
}
