use crate::models::{Budget, BudgetOverview, RawSetBudgetRequest, SetBudgetRequest};
use crate::repository::BudgetRepository;
use database::{Database, RepositoryError};
use expenses::service::ExpenseService;
use tracing::instrument;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Budget not found")]
    NotFound,
}

impl From<RepositoryError> for BudgetError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => BudgetError::NotFound,
            RepositoryError::CheckViolation(msg) => BudgetError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => BudgetError::Infrastructure(e.to_string()),
        }
    }
}

pub struct BudgetService;

impl BudgetService {
    /// Sets the month's budget, replacing any earlier value for the same month.
    #[instrument(skip(db))]
    pub async fn set_budget(
        db: &Database,
        month: String,
        payload: RawSetBudgetRequest,
    ) -> Result<Budget, BudgetError> {
        payload
            .validate()
            .map_err(|e| BudgetError::InvalidInput(common::validation_message(&e)))?;

        let amount = payload
            .amount
            .ok_or_else(|| BudgetError::InvalidInput("Budget amount must be a positive number".into()))?;

        let req = SetBudgetRequest::new(month, amount).map_err(BudgetError::InvalidInput)?;

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = BudgetRepository::new(uow.connection());

        let budget = repo.upsert(&req).await?;

        uow.commit().await.map_err(RepositoryError::from)?;
        Ok(budget)
    }

    #[instrument(skip(db))]
    pub async fn get_budget(db: &Database, month: &str) -> Result<Option<Budget>, BudgetError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = BudgetRepository::new(uow.connection());

        Ok(repo.find_for_month(month).await?)
    }

    /// Budget (0 when unset) and spend so far for `month`.
    #[instrument(skip(db))]
    pub async fn overview(db: &Database, month: &str) -> Result<BudgetOverview, BudgetError> {
        let budget = Self::get_budget(db, month).await?;

        let summary = ExpenseService::get_monthly_summary(db, month).await.map_err(|e| {
            tracing::error!("Failed to load monthly summary for budget overview: {}", e);
            BudgetError::Infrastructure(e.to_string())
        })?;

        Ok(BudgetOverview {
            month: month.to_string(),
            budget: budget.map(|b| b.amount).unwrap_or(0),
            spent: summary.map(|s| s.total_spent).unwrap_or(0),
        })
    }
}
