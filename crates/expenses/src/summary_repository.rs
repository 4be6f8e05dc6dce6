use crate::models::MonthlySummary;
use database::{self, RepositoryError};
use sqlx::FromRow;
use std::collections::BTreeMap;

#[derive(FromRow)]
struct MonthlySummaryRecord {
    month: String,
    total_spent: i64,
}

#[derive(FromRow)]
struct CategoryTotalRecord {
    month: String,
    category: String,
    amount: i64,
}

pub(crate) struct MonthlySummaryRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> MonthlySummaryRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn find(&mut self, month: &str) -> Result<Option<MonthlySummary>, RepositoryError> {
        let record = sqlx::query_as::<_, MonthlySummaryRecord>(
            "SELECT month, total_spent FROM monthly_summaries WHERE month = $1",
        )
        .bind(month)
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let categories = sqlx::query_as::<_, CategoryTotalRecord>(
            "SELECT month, category, amount FROM monthly_summary_categories WHERE month = $1",
        )
        .bind(month)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(Some(MonthlySummary {
            month: record.month,
            total_spent: record.total_spent,
            by_category: categories.into_iter().map(|c| (c.category, c.amount)).collect(),
        }))
    }

    /// Writes the whole summary back: the total row is upserted and the category
    /// rows are replaced.
    pub async fn save(&mut self, summary: &MonthlySummary) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO monthly_summaries (month, total_spent)
            VALUES ($1, $2)
            ON CONFLICT(month) DO UPDATE SET
            total_spent = excluded.total_spent
            "#,
        )
        .bind(&summary.month)
        .bind(summary.total_spent)
        .execute(&mut *self.conn)
        .await?;

        sqlx::query("DELETE FROM monthly_summary_categories WHERE month = $1")
            .bind(&summary.month)
            .execute(&mut *self.conn)
            .await?;

        for (category, amount) in &summary.by_category {
            sqlx::query(
                "INSERT INTO monthly_summary_categories (month, category, amount) VALUES ($1, $2, $3)",
            )
            .bind(&summary.month)
            .bind(category)
            .bind(*amount)
            .execute(&mut *self.conn)
            .await?;
        }

        Ok(())
    }

    /// All summaries, oldest month first.
    pub async fn list(&mut self) -> Result<Vec<MonthlySummary>, RepositoryError> {
        let records = sqlx::query_as::<_, MonthlySummaryRecord>(
            "SELECT month, total_spent FROM monthly_summaries ORDER BY month ASC",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let categories = sqlx::query_as::<_, CategoryTotalRecord>(
            "SELECT month, category, amount FROM monthly_summary_categories",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let mut grouped: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
        for c in categories {
            grouped.entry(c.month).or_default().insert(c.category, c.amount);
        }

        Ok(records
            .into_iter()
            .map(|r| MonthlySummary {
                by_category: grouped.remove(&r.month).unwrap_or_default(),
                month: r.month,
                total_spent: r.total_spent,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    #[tokio::test]
    async fn test_find_missing_month() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = MonthlySummaryRepository::new(uow.connection());

        assert!(repo.find("2026-10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_overwrite() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = MonthlySummaryRepository::new(uow.connection());

        let mut summary = MonthlySummary::opened_with("2026-10".into(), 1000, "Food");
        summary.record_expense(500, "Rent").unwrap();
        repo.save(&summary).await.unwrap();
        assert_eq!(repo.find("2026-10").await.unwrap(), Some(summary.clone()));

        summary.reverse_expense(500, "Rent");
        repo.save(&summary).await.unwrap();

        let stored = repo.find("2026-10").await.unwrap().unwrap();
        assert_eq!(stored.total_spent, 1000);
        assert!(!stored.by_category.contains_key("Rent"));
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = MonthlySummaryRepository::new(uow.connection());

        repo.save(&MonthlySummary::opened_with("2026-10".into(), 300, "C")).await.unwrap();
        repo.save(&MonthlySummary::opened_with("2025-12".into(), 100, "A")).await.unwrap();
        repo.save(&MonthlySummary::opened_with("2026-01".into(), 200, "B")).await.unwrap();

        let list = repo.list().await.unwrap();
        let months: Vec<&str> = list.iter().map(|s| s.month.as_str()).collect();
        assert_eq!(months, vec!["2025-12", "2026-01", "2026-10"]);
        assert_eq!(list[1].by_category["B"], 200);
    }
}
