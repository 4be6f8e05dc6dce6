use crate::models::{CreateExpenseRequest, Expense, TIMESTAMP_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct ExpenseRecord {
    id: i64,
    amount: i64,
    category: String,
    spent_at: String,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = RepositoryError;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        let date = NaiveDateTime::parse_from_str(&record.spent_at, TIMESTAMP_FORMAT)
            .map_err(RepositoryError::decode)?;

        Ok(Expense {
            id: record.id,
            amount: record.amount,
            category: record.category,
            date,
        })
    }
}

fn into_expenses(records: Vec<ExpenseRecord>) -> Result<Vec<Expense>, RepositoryError> {
    records.into_iter().map(Expense::try_from).collect()
}

pub(crate) struct ExpenseRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> ExpenseRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateExpenseRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO expenses (amount, category, spent_at) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(req.amount())
        .bind(req.category())
        .bind(req.spent_at().format(TIMESTAMP_FORMAT).to_string())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Expense>, RepositoryError> {
        let record = sqlx::query_as::<_, ExpenseRecord>(
            "SELECT id, amount, category, spent_at FROM expenses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Expense::try_from).transpose()
    }

    /// Every expense, newest first.
    pub async fn list_all(&mut self) -> Result<Vec<Expense>, RepositoryError> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            "SELECT id, amount, category, spent_at FROM expenses ORDER BY spent_at DESC, id DESC",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        into_expenses(records)
    }

    /// Expenses with `start <= spent_at < end`, newest first.
    pub async fn list_between(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            "SELECT id, amount, category, spent_at FROM expenses WHERE spent_at >= $1 AND spent_at < $2 ORDER BY spent_at DESC, id DESC",
        )
        .bind(start.format(TIMESTAMP_FORMAT).to_string())
        .bind(end.format(TIMESTAMP_FORMAT).to_string())
        .fetch_all(&mut *self.conn)
        .await?;

        into_expenses(records)
    }

    pub async fn list_on_day(&mut self, day: NaiveDate) -> Result<Vec<Expense>, RepositoryError> {
        let start = day.and_time(chrono::NaiveTime::MIN);
        let end = match day.succ_opt() {
            Some(next) => next.and_time(chrono::NaiveTime::MIN),
            None => NaiveDateTime::MAX,
        };
        self.list_between(start, end).await
    }

    pub async fn list_by_month(&mut self, month: &str) -> Result<Vec<Expense>, RepositoryError> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            "SELECT id, amount, category, spent_at FROM expenses WHERE strftime('%Y-%m', spent_at) = $1 ORDER BY spent_at DESC, id DESC",
        )
        .bind(month)
        .fetch_all(&mut *self.conn)
        .await?;

        into_expenses(records)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
