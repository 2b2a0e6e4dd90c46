use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Transaction, TransactionWithCategory};
use crate::database::repository::{PgRepository, Repository};

#[async_trait]
pub trait TransactionRepository: Repository<Transaction> {
    /// Newest `transaction_date` first, ties broken by newest `created_at`.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionWithCategory>, DatabaseError>;

    async fn count_by_user(&self, user_id: Uuid) -> Result<i64, DatabaseError>;
}

#[async_trait]
impl TransactionRepository for PgRepository<Transaction> {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionWithCategory>, DatabaseError> {
        let rows = sqlx::query_as::<_, TransactionWithCategory>(
            r#"
            SELECT t.*, cat.name AS category_name
            FROM transactions t
            LEFT JOIN categories cat ON cat.id = t.category_id
            WHERE t.user_id = $1 AND t.deleted_at IS NULL
            ORDER BY t.transaction_date DESC, t.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;
        Ok(total)
    }
}
