use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::database::models::{Cost, CostWithCategory};
use crate::database::repositories::{CategoryRepository, CostFilter, CostRepository};
use crate::database::{DatabaseError, Owned, Repository};
use crate::services::{CrudService, ServiceError};
use crate::validation::{validate_positive_amount, CURRENCY_RE};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(regex(path = *CURRENCY_RE, message = "must be exactly 3 uppercase letters"))]
    pub currency: String,
    pub incurred_at: DateTime<Utc>,
    pub category_id: Uuid,
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    #[validate(regex(path = *CURRENCY_RE, message = "must be exactly 3 uppercase letters"))]
    pub currency: Option<String>,
    pub incurred_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
}

pub struct CostService {
    crud: CrudService<Cost, dyn CostRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl CostService {
    pub fn new(repo: Arc<dyn CostRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self {
            crud: CrudService::new(repo),
            categories,
        }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        request: CreateCostRequest,
    ) -> Result<CostWithCategory, ServiceError> {
        request.validate()?;
        let cost = Cost::new(
            user.id,
            request.category_id,
            request.title,
            request.amount,
            request.currency,
            request.incurred_at,
        );

        let category_name = self.category_name(user, cost.category_id).await?;
        let cost = self.crud.create(cost).await?;
        Ok(CostWithCategory {
            cost,
            category_name: Some(category_name),
        })
    }

    pub async fn get(&self, user: &AuthUser, id: Uuid) -> Result<CostWithCategory, ServiceError> {
        let cost = self.crud.get_owned(id, user.id).await?;
        self.with_category(cost).await
    }

    /// The caller's costs within `filter`, newest first, with the filtered total
    pub async fn list_with_category(
        &self,
        user: &AuthUser,
        filter: CostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CostWithCategory>, i64), ServiceError> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if end < start {
                return Err(ServiceError::InvalidInput(
                    "endDate must not be before startDate".into(),
                ));
            }
        }
        let repo = self.crud.repository();
        let items = repo
            .list_with_category(user.id, &filter, limit, offset)
            .await?;
        let total = repo.count_by_user(user.id, &filter).await?;
        Ok((items, total))
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        id: Uuid,
        request: UpdateCostRequest,
    ) -> Result<CostWithCategory, ServiceError> {
        request.validate()?;
        let mut cost = self.crud.get_owned(id, user.id).await?;

        if let Some(category_id) = request.category_id {
            if category_id != cost.category_id {
                self.category_name(user, category_id).await?;
                cost.category_id = category_id;
            }
        }
        if let Some(title) = request.title {
            cost.title = title;
        }
        if let Some(amount) = request.amount {
            cost.amount = amount;
        }
        if let Some(currency) = request.currency {
            cost.currency = currency;
        }
        if let Some(incurred_at) = request.incurred_at {
            cost.incurred_at = incurred_at;
        }
        cost.updated_at = Utc::now();

        let cost = self.crud.update(cost).await?;
        self.with_category(cost).await
    }

    pub async fn delete(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        self.crud.get_owned(id, user.id).await?;
        self.crud.delete(id).await
    }

    /// Name of a category the caller owns; anything else reads as missing
    async fn category_name(&self, user: &AuthUser, category_id: Uuid) -> Result<String, ServiceError> {
        let category = self.categories.get_by_id(category_id).await?;
        if category.owner_id() != user.id {
            return Err(ServiceError::NotFound);
        }
        Ok(category.name)
    }

    async fn with_category(&self, cost: Cost) -> Result<CostWithCategory, ServiceError> {
        let category_name = match self.categories.get_by_id(cost.category_id).await {
            Ok(category) => Some(category.name),
            Err(DatabaseError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(CostWithCategory {
            cost,
            category_name,
        })
    }
}
