use axum::extract::State;

use crate::app::AppState;
use crate::database::models::User;
use crate::handlers::extract::{EntityId, JsonBody, ValidatedQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UpdateUserRequest;

use super::OffsetQuery;

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<OffsetQuery>,
) -> ApiResult<Vec<User>> {
    let users = state.users.list(query.limit(), query.offset()).await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/v1/users/:id
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.get(id).await?))
}

/// PUT /api/v1/users/:id - callers may only edit their own profile
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<User> {
    let updated = state.users.update_profile(&user, id, request).await?;
    Ok(ApiResponse::success(updated).with_message("User updated successfully"))
}
