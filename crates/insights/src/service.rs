use crate::calculator::{self, InsightWindow, Insights};
use chrono::NaiveDate;
use common::calendar;
use common::money::AmountOverflow;
use database::Database;
use expenses::service::{ExpenseError, ExpenseService};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
}

impl From<AmountOverflow> for InsightsError {
    fn from(err: AmountOverflow) -> Self {
        InsightsError::InvalidInput(err.to_string())
    }
}

impl From<ExpenseError> for InsightsError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::InvalidInput(msg) => InsightsError::InvalidInput(msg),
            _ => InsightsError::Infrastructure(err.to_string()),
        }
    }
}

pub struct InsightsService;

impl InsightsService {
    /// Computes insights for the month containing `today`, with the per-day figures
    /// taken over `window`.
    #[instrument(skip(db))]
    pub async fn compute(
        db: &Database,
        today: NaiveDate,
        window: InsightWindow,
    ) -> Result<Insights, InsightsError> {
        let month = calendar::month_key(today);
        let previous_month = calendar::previous_month(&month)
            .ok_or_else(|| InsightsError::InvalidInput(format!("No month before {}", month)))?;

        let expenses = match &window {
            InsightWindow::Day { date } => ExpenseService::list_for_day(db, *date).await?,
            InsightWindow::Month { month } => ExpenseService::list_for_month(db, month).await?,
            InsightWindow::All => ExpenseService::list_expenses(db).await?,
        };

        let summaries = ExpenseService::list_monthly_summaries(db).await?;

        Ok(calculator::summarize(window, &expenses, &summaries, &month, &previous_month)?)
    }
}
