use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::database::repository::{Entity, Owned, PgQuery};
use crate::validation::validate_positive_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown transaction type: {0}")]
pub struct UnknownTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            other => Err(UnknownTransactionType(other.to_string())),
        }
    }
}

impl TryFrom<String> for TransactionType {
    type Error = UnknownTransactionType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub transaction_type: TransactionType,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        category_id: Uuid,
        amount: Decimal,
        transaction_type: TransactionType,
        description: Option<String>,
        transaction_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            amount,
            transaction_type,
            description,
            transaction_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Entity for Transaction {
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "category_id",
        "amount",
        "transaction_type",
        "description",
        "transaction_date",
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
            .bind(self.amount)
            .bind(self.transaction_type.as_str())
            .bind(&self.description)
            .bind(self.transaction_date)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Owned for Transaction {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// A transaction with its category name attached
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithCategory {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_parses_only_known_values() {
        assert_eq!("INCOME".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!("EXPENSE".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("expense".parse::<TransactionType>().is_err());
        assert!(TransactionType::try_from("TRANSFER".to_string()).is_err());
    }

    #[test]
    fn serializes_type_and_date_in_wire_format() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Decimal::new(1250, 2),
            TransactionType::Expense,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        let json = serde_json::to_value(TransactionWithCategory {
            transaction: tx,
            category_name: Some("Food".to_string()),
        })
        .unwrap();

        assert_eq!(json["type"], "EXPENSE");
        assert_eq!(json["transactionDate"], "2024-01-15");
        assert_eq!(json["categoryName"], "Food");
        assert_eq!(json["amount"], 12.5);
        assert!(json.get("deletedAt").is_none());
    }
}
