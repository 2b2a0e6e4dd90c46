use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::auth::AuthUser;
use crate::database::models::{Category, Transaction, TransactionType, TransactionWithCategory};
use crate::database::repositories::{CategoryRepository, TransactionRepository};
use crate::database::{DatabaseError, Owned, Repository};
use crate::services::{page_offset, CrudService, ServiceError};
use crate::validation::validate_positive_amount;

const TYPE_MESSAGE: &str = "must be one of INCOME, EXPENSE";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub category_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    /// Parsed into [`TransactionType`]; errors are reported under `type`
    #[serde(rename = "type")]
    pub transaction_type: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    pub category_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub transaction_date: Option<NaiveDate>,
}

pub struct TransactionService {
    crud: CrudService<Transaction, dyn TransactionRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl TransactionService {
    pub fn new(
        repo: Arc<dyn TransactionRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            crud: CrudService::new(repo),
            categories,
        }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        request: CreateTransactionRequest,
    ) -> Result<TransactionWithCategory, ServiceError> {
        let transaction_type = validated_type(request.validate(), &request.transaction_type)?;
        let transaction = Transaction::new(
            user.id,
            request.category_id,
            request.amount,
            transaction_type,
            request.description,
            request.transaction_date,
        );

        let category = self.owned_category(user, transaction.category_id).await?;
        let transaction = self.crud.create(transaction).await?;

        tracing::debug!("Created transaction {} for user {}", transaction.id, user.id);
        Ok(TransactionWithCategory {
            transaction,
            category_name: Some(category.name),
        })
    }

    pub async fn get(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<TransactionWithCategory, ServiceError> {
        let transaction = self.crud.get_owned(id, user.id).await?;
        self.with_category(transaction).await
    }

    /// A 1-based page of the caller's transactions and their total count
    pub async fn list(
        &self,
        user: &AuthUser,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<TransactionWithCategory>, i64), ServiceError> {
        let repo = self.crud.repository();
        let items = repo
            .list_by_user(user.id, limit, page_offset(page, limit))
            .await?;
        let total = repo.count_by_user(user.id).await?;
        Ok((items, total))
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        id: Uuid,
        request: UpdateTransactionRequest,
    ) -> Result<TransactionWithCategory, ServiceError> {
        let transaction_type = match request.transaction_type.as_deref() {
            Some(raw) => Some(validated_type(request.validate(), raw)?),
            None => {
                request.validate()?;
                None
            }
        };
        let mut transaction = self.crud.get_owned(id, user.id).await?;

        let mut category = None;
        if let Some(category_id) = request.category_id {
            if category_id != transaction.category_id {
                category = Some(self.owned_category(user, category_id).await?);
                transaction.category_id = category_id;
            }
        }
        if let Some(amount) = request.amount {
            transaction.amount = amount;
        }
        if let Some(kind) = transaction_type {
            transaction.transaction_type = kind;
        }
        if let Some(description) = request.description {
            transaction.description = Some(description);
        }
        if let Some(date) = request.transaction_date {
            transaction.transaction_date = date;
        }
        transaction.updated_at = Utc::now();

        let transaction = self.crud.update(transaction).await?;
        match category {
            Some(category) => Ok(TransactionWithCategory {
                transaction,
                category_name: Some(category.name),
            }),
            None => self.with_category(transaction).await,
        }
    }

    pub async fn delete(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        self.crud.get_owned(id, user.id).await?;
        self.crud.delete(id).await
    }

    /// The category must exist and belong to the caller
    async fn owned_category(
        &self,
        user: &AuthUser,
        category_id: Uuid,
    ) -> Result<Category, ServiceError> {
        let category = self.categories.get_by_id(category_id).await?;
        if category.owner_id() != user.id {
            tracing::warn!(
                "User {} referenced category {} owned by another user",
                user.id,
                category_id
            );
            return Err(ServiceError::Unauthorized);
        }
        Ok(category)
    }

    async fn with_category(
        &self,
        transaction: Transaction,
    ) -> Result<TransactionWithCategory, ServiceError> {
        let category_name = match self.categories.get_by_id(transaction.category_id).await {
            Ok(category) => Some(category.name),
            Err(DatabaseError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(TransactionWithCategory {
            transaction,
            category_name,
        })
    }
}

/// Combine the request's field errors with the `type` check so all are reported together
fn validated_type(
    checked: Result<(), ValidationErrors>,
    raw: &str,
) -> Result<TransactionType, ServiceError> {
    let mut errors = checked.err().unwrap_or_else(ValidationErrors::new);
    match raw.parse::<TransactionType>() {
        Ok(kind) if errors.errors().is_empty() => Ok(kind),
        Ok(_) => Err(errors.into()),
        Err(_) => {
            let mut error = ValidationError::new("enum");
            error.message = Some(TYPE_MESSAGE.into());
            errors.add("type", error);
            Err(errors.into())
        }
    }
}
