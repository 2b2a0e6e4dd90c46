use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::database::models::TransactionWithCategory;
use crate::handlers::extract::{EntityId, JsonBody, ValidatedQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, PageResult, Paginated};
use crate::services::{CreateTransactionRequest, UpdateTransactionRequest};

use super::DEFAULT_LIMIT;

/// `?page=&limit=`, 1-based
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1, max = 100_000))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

/// POST /api/v1/transactions
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateTransactionRequest>,
) -> ApiResult<TransactionWithCategory> {
    let transaction = state.transactions.create(&user, request).await?;
    Ok(ApiResponse::created(transaction).with_message("Transaction created successfully"))
}

/// GET /api/v1/transactions
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> PageResult<TransactionWithCategory> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let (items, total) = state.transactions.list(&user, page, limit).await?;

    Ok(Paginated {
        items,
        total,
        page,
        limit,
    })
}

/// GET /api/v1/transactions/:id
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<TransactionWithCategory> {
    Ok(ApiResponse::success(state.transactions.get(&user, id).await?))
}

/// PUT /api/v1/transactions/:id - applies only the fields present
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
    JsonBody(request): JsonBody<UpdateTransactionRequest>,
) -> ApiResult<TransactionWithCategory> {
    let transaction = state.transactions.update(&user, id, request).await?;
    Ok(ApiResponse::success(transaction).with_message("Transaction updated successfully"))
}

/// DELETE /api/v1/transactions/:id
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Option<()>> {
    state.transactions.delete(&user, id).await?;
    Ok(ApiResponse::success(None).with_message("Transaction deleted successfully"))
}
