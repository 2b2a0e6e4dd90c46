use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::Query,
    FromRow, PgPool, Postgres,
};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A persisted record with a UUID primary key.
///
/// `COLUMNS` lists every stored column except `id`, in the order
/// `bind_columns` binds them. Soft-deletable tables carry a nullable
/// `deleted_at` column that every default query filters on.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const SOFT_DELETE: bool = false;

    fn id(&self) -> Uuid;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;
}

/// Records that belong to a single user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// CRUD contract shared by every entity store
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    async fn create(&self, entity: &T) -> Result<(), DatabaseError>;

    /// Missing (or soft-deleted) rows yield `DatabaseError::NotFound`.
    async fn get_by_id(&self, id: Uuid) -> Result<T, DatabaseError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, DatabaseError>;

    /// Full replace by primary key.
    async fn update(&self, entity: &T) -> Result<(), DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError>;
}

pub struct PgRepository<T> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<T: Entity> PgRepository<T> {
    fn live_filter() -> &'static str {
        if T::SOFT_DELETE {
            " AND deleted_at IS NULL"
        } else {
            ""
        }
    }

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len() + 1)
            .map(|i| format!("${}", i))
            .collect();
        format!(
            "INSERT INTO {} (id, {}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        )
    }

    fn update_sql() -> String {
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 2))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE id = $1{}",
            T::TABLE,
            assignments.join(", "),
            Self::live_filter()
        )
    }

    fn not_found() -> DatabaseError {
        DatabaseError::NotFound(format!("{} record not found", T::TABLE))
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for PgRepository<T> {
    async fn create(&self, entity: &T) -> Result<(), DatabaseError> {
        let sql = Self::insert_sql();
        entity
            .bind_columns(sqlx::query(&sql).bind(entity.id()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} WHERE id = $1{}",
            T::TABLE,
            Self::live_filter()
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(Self::not_found)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, DatabaseError> {
        let filter = if T::SOFT_DELETE {
            " WHERE deleted_at IS NULL"
        } else {
            ""
        };
        let sql = format!(
            "SELECT * FROM {}{} ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            T::TABLE,
            filter
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update(&self, entity: &T) -> Result<(), DatabaseError> {
        let sql = Self::update_sql();
        let result = entity
            .bind_columns(sqlx::query(&sql).bind(entity.id()))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let sql = if T::SOFT_DELETE {
            format!(
                "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
                T::TABLE
            )
        } else {
            format!("DELETE FROM {} WHERE id = $1", T::TABLE)
        };
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found());
        }
        Ok(())
    }
}
