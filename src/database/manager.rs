use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::{DatabaseConfig, Environment};

/// Errors surfaced by the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        let classified = match &err {
            sqlx::Error::RowNotFound => Some(DatabaseError::NotFound("Record not found".to_string())),
            sqlx::Error::Database(db) if db.is_unique_violation() => Some(
                DatabaseError::UniqueViolation(db.constraint().unwrap_or("unique").to_string()),
            ),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => Some(
                DatabaseError::ForeignKeyViolation(
                    db.constraint().unwrap_or("foreign_key").to_string(),
                ),
            ),
            _ => None,
        };

        match classified {
            Some(mapped) => mapped,
            None => DatabaseError::Sqlx(err),
        }
    }
}

/// Connectivity check used by the health endpoint
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Owns the shared connection pool for the process
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = Self::pool_options(config)
            .connect_with(config.connect_options())
            .await?;

        info!(
            "Connected to database {} on {}:{}",
            config.name, config.host, config.port
        );
        Ok(Self { pool })
    }

    /// Build a manager whose connections open on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let pool = Self::pool_options(config).connect_lazy_with(config.connect_options());
        Self { pool }
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations unless the environment forbids it
    pub async fn migrate(&self, environment: Environment) -> Result<(), DatabaseError> {
        if !environment.auto_migrate() {
            info!("Skipping automatic migrations in {:?}", environment);
            return Ok(());
        }

        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[async_trait]
impl HealthCheck for DatabaseManager {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
