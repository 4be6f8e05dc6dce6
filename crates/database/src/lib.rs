use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub use sqlx::Error;
pub use sqlx::Result;

pub type Driver = Sqlite;
pub type Connection = sqlx::SqliteConnection;
pub type Pool = SqlitePool;

static TEST_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Infrastructure(sqlx::Error),
    #[error("Resource not found")]
    NotFound,
    /// A row broke one of the schema's CHECK constraints (e.g. a non-positive amount).
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),
}

impl RepositoryError {
    /// A stored column that could not be turned back into its domain type.
    pub fn decode<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RepositoryError::Infrastructure(sqlx::Error::Decode(Box::new(err)))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return RepositoryError::NotFound;
        }

        match err.as_database_error() {
            Some(db_err) if db_err.is_check_violation() => {
                RepositoryError::CheckViolation(db_err.message().to_string())
            }
            _ => RepositoryError::Infrastructure(err),
        }
    }
}

fn connect_options(url: &str) -> sqlx::Result<SqliteConnectOptions> {
    Ok(SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5)))
}

#[derive(Clone)]
pub struct Database {
    pub pool: Pool,
}

impl Database {
    pub async fn new(url: &str) -> sqlx::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .connect_with(connect_options(url)?)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("Applying migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("Schema is up to date");
        Ok(())
    }

    /// Opens a transaction. Nothing written through it is visible until `commit`;
    /// dropping it rolls every write back.
    pub async fn begin(&self) -> Result<UnitOfWork<'_>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork { tx })
    }
}

pub struct UnitOfWork<'a> {
    tx: Transaction<'a, Driver>,
}

impl UnitOfWork<'_> {
    pub async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut self.tx
    }
}

// Not behind #[cfg(test)]: the domain crates call it from their own tests.
pub async fn get_test_db() -> Database {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let seq = TEST_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "spendly_test_{}_{}_{}.db",
        std::process::id(),
        nanos,
        seq
    ));

    let options = connect_options(&format!("sqlite:{}", path.display()))
        .expect("Invalid test database path");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open test database");

    let db = Database { pool };
    db.run_migrations().await.expect("Failed to migrate test database");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_violation_is_mapped() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let err = sqlx::query("INSERT INTO budgets (month, amount) VALUES ($1, $2)")
            .bind("2026-01")
            .bind(-1_i64)
            .execute(uow.connection())
            .await
            .unwrap_err();

        assert!(matches!(RepositoryError::from(err), RepositoryError::CheckViolation(_)));
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let err = sqlx::query_scalar::<_, i64>("SELECT amount FROM budgets WHERE month = $1")
            .bind("2026-01")
            .fetch_one(uow.connection())
            .await
            .unwrap_err();

        assert!(matches!(RepositoryError::from(err), RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_category_rows_need_a_summary() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let err = sqlx::query(
            "INSERT INTO monthly_summary_categories (month, category, amount) VALUES ($1, $2, $3)",
        )
        .bind("2026-01")
        .bind("Food")
        .bind(100_i64)
        .execute(uow.connection())
        .await
        .unwrap_err();

        assert!(matches!(RepositoryError::from(err), RepositoryError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let db = get_test_db().await;

        {
            let mut uow = db.begin().await.unwrap();
            sqlx::query("INSERT INTO budgets (month, amount) VALUES ($1, $2)")
                .bind("2026-02")
                .bind(100_i64)
                .execute(uow.connection())
                .await
                .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM budgets")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
