use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::database::models::CostWithCategory;
use crate::database::repositories::CostFilter;
use crate::handlers::extract::{EntityId, JsonBody, ValidatedQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, PageResult, Paginated};
use crate::services::{CreateCostRequest, UpdateCostRequest};

use super::OffsetQuery;

/// `?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD&limit=&offset=`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CostListQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000))]
    pub offset: Option<i64>,
}

impl CostListQuery {
    fn window(&self) -> OffsetQuery {
        OffsetQuery {
            limit: self.limit,
            offset: self.offset,
        }
    }

    fn filter(&self) -> CostFilter {
        CostFilter {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// POST /api/v1/costs
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateCostRequest>,
) -> ApiResult<CostWithCategory> {
    let cost = state.costs.create(&user, request).await?;
    Ok(ApiResponse::created(cost).with_message("Cost created successfully"))
}

/// GET /api/v1/costs - newest first, optionally bounded to calendar days
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<CostListQuery>,
) -> PageResult<CostWithCategory> {
    let filter = query.filter();
    let window = query.window();
    let (items, total) = state
        .costs
        .list_with_category(&user, filter, window.limit(), window.offset())
        .await?;

    Ok(Paginated {
        items,
        total,
        page: window.page(),
        limit: window.limit(),
    })
}

/// GET /api/v1/costs/:id
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<CostWithCategory> {
    Ok(ApiResponse::success(state.costs.get(&user, id).await?))
}

/// PUT /api/v1/costs/:id - applies only the fields present
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
    JsonBody(request): JsonBody<UpdateCostRequest>,
) -> ApiResult<CostWithCategory> {
    let cost = state.costs.update(&user, id, request).await?;
    Ok(ApiResponse::success(cost).with_message("Cost updated successfully"))
}

/// DELETE /api/v1/costs/:id
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<()> {
    state.costs.delete(&user, id).await?;
    Ok(ApiResponse::no_content())
}
