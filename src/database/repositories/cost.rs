use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Cost, CostWithCategory};
use crate::database::repository::{PgRepository, Repository};

/// Calendar-day bounds on `incurred_at`, both ends inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl CostFilter {
    /// Lower bound: midnight UTC at the start of `start_date`.
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(midnight_utc)
    }

    /// Exclusive upper bound: midnight UTC of the day after `end_date`.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|date| date.checked_add_days(Days::new(1)))
            .map(midnight_utc)
    }

    pub fn matches(&self, incurred_at: DateTime<Utc>) -> bool {
        self.lower_bound().map_or(true, |lower| incurred_at >= lower)
            && self.upper_bound().map_or(true, |upper| incurred_at < upper)
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[async_trait]
pub trait CostRepository: Repository<Cost> {
    /// The caller's live costs with category names, newest `incurred_at` first.
    async fn list_with_category(
        &self,
        user_id: Uuid,
        filter: &CostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CostWithCategory>, DatabaseError>;

    async fn count_by_user(&self, user_id: Uuid, filter: &CostFilter) -> Result<i64, DatabaseError>;
}

#[async_trait]
impl CostRepository for PgRepository<Cost> {
    async fn list_with_category(
        &self,
        user_id: Uuid,
        filter: &CostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CostWithCategory>, DatabaseError> {
        let rows = sqlx::query_as::<_, CostWithCategory>(
            r#"
            SELECT c.*, cat.name AS category_name
            FROM costs c
            LEFT JOIN categories cat ON cat.id = c.category_id
            WHERE c.user_id = $1
              AND c.deleted_at IS NULL
              AND ($2::timestamptz IS NULL OR c.incurred_at >= $2)
              AND ($3::timestamptz IS NULL OR c.incurred_at < $3)
            ORDER BY c.incurred_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(filter.lower_bound())
        .bind(filter.upper_bound())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn count_by_user(&self, user_id: Uuid, filter: &CostFilter) -> Result<i64, DatabaseError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM costs
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::timestamptz IS NULL OR incurred_at >= $2)
              AND ($3::timestamptz IS NULL OR incurred_at < $3)
            "#,
        )
        .bind(user_id)
        .bind(filter.lower_bound())
        .bind(filter.upper_bound())
        .fetch_one(self.pool())
        .await?;
        Ok(total)
    }
}
