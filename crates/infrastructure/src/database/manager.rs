use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use dispatch_domain::{DispatchError, DispatchRepository, DispatchResult, UserRepository};

use super::postgres::{PostgresDispatchRepository, PostgresUserRepository};

/// Owns the connection pool and hands out repository instances bound to it.
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> DispatchResult<Self> {
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(DispatchError::database_error(
                "database url must start with postgres:// or postgresql://",
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations. Idempotent across restarts.
    pub async fn migrate(&self) -> DispatchResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DispatchError::database_error(format!("migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> DispatchResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        Arc::new(PostgresUserRepository::new(self.pool.clone()))
    }

    pub fn dispatch_repository(&self) -> Arc<dyn DispatchRepository> {
        Arc::new(PostgresDispatchRepository::new(self.pool.clone()))
    }
}
