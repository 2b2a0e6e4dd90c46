use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Category;
use crate::database::repository::{PgRepository, Repository};

#[async_trait]
pub trait CategoryRepository: Repository<Category> {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, DatabaseError>;

    async fn count_by_user(&self, user_id: Uuid) -> Result<i64, DatabaseError>;

    /// Hard-delete a category together with its soft-deleted costs and
    /// transactions. Live references still fail with a foreign-key violation.
    async fn delete_with_history(&self, id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
impl CategoryRepository for PgRepository<Category> {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, DatabaseError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE user_id = $1 ORDER BY name ASC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;
        Ok(total)
    }

    async fn delete_with_history(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let live: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM costs WHERE category_id = $1 AND deleted_at IS NULL) \
                  + (SELECT COUNT(*) FROM transactions WHERE category_id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if live > 0 {
            return Err(DatabaseError::ForeignKeyViolation(
                "categories_live_references".to_string(),
            ));
        }

        sqlx::query("DELETE FROM costs WHERE category_id = $1 AND deleted_at IS NOT NULL")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM transactions WHERE category_id = $1 AND deleted_at IS NOT NULL")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(
                "categories record not found".to_string(),
            ));
        }

        tx.commit().await?;
        Ok(())
    }
}
