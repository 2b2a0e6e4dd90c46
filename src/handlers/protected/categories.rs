use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Category;
use crate::handlers::extract::{EntityId, JsonBody, ValidatedQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, PageResult, Paginated};
use crate::services::CategoryRequest;

use super::OffsetQuery;

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<Category> {
    let category = state.categories.create(&user, request).await?;
    Ok(ApiResponse::created(category).with_message("Category created successfully"))
}

/// GET /api/v1/categories
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<OffsetQuery>,
) -> PageResult<Category> {
    let (items, total) = state
        .categories
        .list(&user, query.limit(), query.offset())
        .await?;

    Ok(Paginated {
        items,
        total,
        page: query.page(),
        limit: query.limit(),
    })
}

/// GET /api/v1/categories/:id
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Category> {
    Ok(ApiResponse::success(state.categories.get(&user, id).await?))
}

/// PUT /api/v1/categories/:id - replaces name and description
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<Category> {
    let category = state.categories.update(&user, id, request).await?;
    Ok(ApiResponse::success(category).with_message("Category updated successfully"))
}

/// DELETE /api/v1/categories/:id
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<()> {
    state.categories.delete(&user, id).await?;
    Ok(ApiResponse::no_content())
}
