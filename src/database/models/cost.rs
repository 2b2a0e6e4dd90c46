use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::repository::{Entity, Owned, PgQuery};
use crate::validation::{validate_positive_amount, CURRENCY_RE};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(regex(path = *CURRENCY_RE, message = "must be exactly 3 uppercase letters"))]
    pub currency: String,
    pub incurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Cost {
    pub fn new(
        user_id: Uuid,
        category_id: Uuid,
        title: String,
        amount: Decimal,
        currency: String,
        incurred_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            title,
            amount,
            currency,
            incurred_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Entity for Cost {
    const TABLE: &'static str = "costs";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "category_id",
        "title",
        "amount",
        "currency",
        "incurred_at",
        "created_at",
        "updated_at",
    ];
    const SOFT_DELETE: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.user_id)
            .bind(self.category_id)
            .bind(&self.title)
            .bind(self.amount)
            .bind(&self.currency)
            .bind(self.incurred_at)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Owned for Cost {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// A cost joined with the name of its category for display
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CostWithCategory {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub cost: Cost,
    pub category_name: Option<String>,
}
