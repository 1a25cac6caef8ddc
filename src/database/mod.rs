use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for any single database operation. An elapsed timeout is
/// reported as a retryable error, never a crash.
const DB_OP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DatabaseManager {
    pub pool: Arc<SqlitePool>,
}

impl DatabaseManager {
    /// Connect using DATABASE_URL, falling back to a local file store.
    pub async fn new() -> Result<Self, sqlx::Error> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:farm_trade.db?mode=rwc".to_string());
        Self::connect(&database_url).await
    }

    /// Connect to an explicit database URL.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        // An in-memory SQLite database exists per connection, so the pool is
        // pinned to a single connection that every caller shares.
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .acquire_timeout(DB_OP_TIMEOUT)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Clone out a handle to the pool.
    pub fn get_pool(&self) -> Arc<SqlitePool> {
        Arc::clone(&self.pool)
    }

    /// Run a closure inside a transaction, committing on Ok and rolling back
    /// on Err. The whole operation is bounded by DB_OP_TIMEOUT.
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Sqlite>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let work = async {
            let mut tx = self.pool.begin().await?;
            let result = f(&mut tx).await;
            match result {
                Ok(r) => {
                    tx.commit().await?;
                    Ok(r)
                }
                Err(e) => {
                    tx.rollback().await?;
                    Err(e)
                }
            }
        };
        match tokio::time::timeout(DB_OP_TIMEOUT, work).await {
            Ok(result) => result,
            Err(_) => Err(E::from(sqlx::Error::PoolTimedOut)),
        }
    }

    /// Create the schema if it does not exist yet.
    pub async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        let create_schema_sql = include_str!("../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;
        Ok(())
    }

    /// Execute a file of semicolon-separated statements.
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
