use crate::models::{Budget, SetBudgetRequest};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct BudgetRecord {
    month: String,
    amount: i64,
}

impl From<BudgetRecord> for Budget {
    fn from(record: BudgetRecord) -> Self {
        Budget {
            month: record.month,
            amount: record.amount,
        }
    }
}

pub(crate) struct BudgetRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> BudgetRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn upsert(&mut self, req: &SetBudgetRequest) -> Result<Budget, RepositoryError> {
        let record = sqlx::query_as::<_, BudgetRecord>(
            r#"
            INSERT INTO budgets (month, amount)
            VALUES ($1, $2)
            ON CONFLICT(month) DO UPDATE SET
            amount = excluded.amount
            RETURNING month, amount
            "#,
        )
        .bind(req.month())
        .bind(req.amount())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(record.into())
    }

    pub async fn find_for_month(&mut self, month: &str) -> Result<Option<Budget>, RepositoryError> {
        let record = sqlx::query_as::<_, BudgetRecord>(
            "SELECT month, amount FROM budgets WHERE month = $1",
        )
        .bind(month)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record.map(|r| r.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = BudgetRepository::new(uow.connection());

        let first = repo.upsert(&SetBudgetRequest::new("2026-10".into(), 100.0).unwrap()).await.unwrap();
        assert_eq!(first.amount, 10000);

        let second = repo.upsert(&SetBudgetRequest::new("2026-10".into(), 250.0).unwrap()).await.unwrap();
        assert_eq!(second.amount, 25000);

        assert_eq!(repo.find_for_month("2026-10").await.unwrap(), Some(second));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM budgets")
            .fetch_one(uow.connection())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_months_are_independent() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = BudgetRepository::new(uow.connection());

        repo.upsert(&SetBudgetRequest::new("2026-09".into(), 100.0).unwrap()).await.unwrap();
        repo.upsert(&SetBudgetRequest::new("2026-10".into(), 200.0).unwrap()).await.unwrap();

        assert_eq!(repo.find_for_month("2026-09").await.unwrap().unwrap().amount, 10000);
        assert_eq!(repo.find_for_month("2026-10").await.unwrap().unwrap().amount, 20000);
        assert!(repo.find_for_month("2026-11").await.unwrap().is_none());
    }
}
