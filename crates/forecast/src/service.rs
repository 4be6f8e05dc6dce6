use crate::calculator::{self, Forecast, ForecastInput};
use budgets::service::BudgetService;
use chrono::{Datelike, NaiveDate};
use common::calendar;
use common::money::{self, AmountOverflow};
use database::Database;
use expenses::service::ExpenseService;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
}

impl From<AmountOverflow> for ForecastError {
    fn from(err: AmountOverflow) -> Self {
        ForecastError::InvalidInput(err.to_string())
    }
}

pub struct ForecastService;

impl ForecastService {
    /// Projects the month containing `today` from the expenses dated between the
    /// first of the month and the end of `today`.
    #[instrument(skip(db))]
    pub async fn month_to_date(db: &Database, today: NaiveDate) -> Result<Forecast, ForecastError> {
        let month = calendar::month_key(today);
        let first = calendar::first_day_of_month(today);

        let expenses = ExpenseService::list_for_period(db, first, today).await.map_err(|e| {
            tracing::error!("Failed to load expenses for forecast: {}", e);
            ForecastError::Infrastructure(e.to_string())
        })?;

        let budget = BudgetService::get_budget(db, &month).await.map_err(|e| {
            tracing::error!("Failed to load budget for forecast: {}", e);
            ForecastError::Infrastructure(e.to_string())
        })?;

        let input = ForecastInput {
            spent_so_far: money::checked_sum(expenses.iter().map(|e| e.amount))?,
            days_elapsed: today.day(),
            days_in_month: calendar::days_in_month(today),
            budget: budget.map(|b| b.amount),
        };

        tracing::debug!("Forecast input for {}: {:?}", month, input);
        Ok(calculator::project(&input)?)
    }
}
