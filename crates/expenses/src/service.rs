use crate::models::{CreateExpenseRequest, Expense, MonthlySummary, RawCreateExpenseRequest, SpendingTotals};
use crate::repository::ExpenseRepository;
use crate::summary_repository::MonthlySummaryRepository;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::money::AmountOverflow;
use database::{Database, RepositoryError};
use tracing::instrument;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Expense not found")]
    NotFound,
}

impl From<AmountOverflow> for ExpenseError {
    fn from(err: AmountOverflow) -> Self {
        ExpenseError::InvalidInput(err.to_string())
    }
}

impl From<RepositoryError> for ExpenseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExpenseError::NotFound,
            RepositoryError::CheckViolation(msg) => ExpenseError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => ExpenseError::Infrastructure(e.to_string()),
        }
    }
}

pub struct ExpenseService;

impl ExpenseService {
    /// Stores the expense and folds it into its month's summary. Both writes share
    /// one transaction, so either both land or neither does.
    #[instrument(skip(db))]
    pub async fn add_expense(
        db: &Database,
        payload: RawCreateExpenseRequest,
        now: NaiveDateTime,
    ) -> Result<Expense, ExpenseError> {
        payload
            .validate()
            .map_err(|e| ExpenseError::InvalidInput(common::validation_message(&e)))?;

        let (Some(amount), Some(category)) = (payload.amount, payload.category.as_deref()) else {
            return Err(ExpenseError::InvalidInput("Amount and category are required".into()));
        };

        let req = CreateExpenseRequest::new(amount, category, payload.date.as_deref(), now)
            .map_err(ExpenseError::InvalidInput)?;

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;

        let mut repo = ExpenseRepository::new(uow.connection());
        let id = repo.create(&req).await?;
        let expense = repo.find_by_id(id).await?
            .ok_or(ExpenseError::NotFound)?;

        let month = expense.month();
        let mut summaries = MonthlySummaryRepository::new(uow.connection());
        let summary = match summaries.find(&month).await? {
            Some(mut existing) => {
                existing.record_expense(expense.amount, &expense.category)?;
                existing
            }
            None => {
                tracing::debug!("Opening monthly summary for {}", month);
                MonthlySummary::opened_with(month, expense.amount, &expense.category)
            }
        };
        summaries.save(&summary).await?;

        uow.commit().await.map_err(RepositoryError::from)?;

        Ok(expense)
    }

    /// Deletes the expense and removes its contribution from its month's summary.
    #[instrument(skip(db))]
    pub async fn delete_expense(db: &Database, id: i64) -> Result<Expense, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;

        let mut repo = ExpenseRepository::new(uow.connection());
        let expense = repo.find_by_id(id).await?
            .ok_or(ExpenseError::NotFound)?;

        let month = expense.month();
        let mut summaries = MonthlySummaryRepository::new(uow.connection());
        match summaries.find(&month).await? {
            Some(mut summary) => {
                summary.reverse_expense(expense.amount, &expense.category);
                summaries.save(&summary).await?;
            }
            None => {
                tracing::warn!("No monthly summary for {} while deleting expense {}; aggregates left unchanged", month, id);
            }
        }

        let mut repo = ExpenseRepository::new(uow.connection());
        repo.delete(id).await?;

        uow.commit().await.map_err(RepositoryError::from)?;
        Ok(expense)
    }

    #[instrument(skip(db))]
    pub async fn get_expense(db: &Database, id: i64) -> Result<Expense, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let expense = repo.find_by_id(id).await?
            .ok_or(ExpenseError::NotFound)?;

        Ok(expense)
    }

    #[instrument(skip(db))]
    pub async fn list_expenses(db: &Database) -> Result<Vec<Expense>, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        Ok(repo.list_all().await?)
    }

    #[instrument(skip(db))]
    pub async fn list_for_day(db: &Database, day: NaiveDate) -> Result<Vec<Expense>, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        Ok(repo.list_on_day(day).await?)
    }

    #[instrument(skip(db))]
    pub async fn list_for_month(db: &Database, month: &str) -> Result<Vec<Expense>, ExpenseError> {
        if common::calendar::parse_month(month).is_none() {
            return Err(ExpenseError::InvalidInput("Invalid month format. Expected YYYY-MM".into()));
        }

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        Ok(repo.list_by_month(month).await?)
    }

    /// Expenses dated from the start of `first` through the end of `last`, newest first.
    #[instrument(skip(db))]
    pub async fn list_for_period(
        db: &Database,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<Expense>, ExpenseError> {
        let start = first.and_time(NaiveTime::MIN);
        let end = match last.succ_opt() {
            Some(next) => next.and_time(NaiveTime::MIN),
            None => NaiveDateTime::MAX,
        };

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        Ok(repo.list_between(start, end).await?)
    }

    #[instrument(skip(db))]
    pub async fn list_monthly_summaries(db: &Database) -> Result<Vec<MonthlySummary>, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = MonthlySummaryRepository::new(uow.connection());

        Ok(repo.list().await?)
    }

    #[instrument(skip(db))]
    pub async fn get_monthly_summary(
        db: &Database,
        month: &str,
    ) -> Result<Option<MonthlySummary>, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = MonthlySummaryRepository::new(uow.connection());

        Ok(repo.find(month).await?)
    }

    /// All-time totals computed from the expense records themselves.
    #[instrument(skip(db))]
    pub async fn spending_totals(db: &Database) -> Result<SpendingTotals, ExpenseError> {
        let expenses = Self::list_expenses(db).await?;
        Ok(SpendingTotals::from_expenses(&expenses)?)
    }
}
