use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::database::models::Category;
use crate::database::repositories::CategoryRepository;
use crate::database::DatabaseError;
use crate::services::{CrudService, ServiceError};

/// Body for both create and full-replace update
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

pub struct CategoryService {
    crud: CrudService<Category, dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self {
            crud: CrudService::new(repo),
        }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        request: CategoryRequest,
    ) -> Result<Category, ServiceError> {
        let category = Category::new(user.id, request.name, request.description);
        self.crud.create(category).await.map_err(store_conflict)
    }

    pub async fn get(&self, user: &AuthUser, id: Uuid) -> Result<Category, ServiceError> {
        self.crud.get_owned(id, user.id).await
    }

    /// A page of the caller's categories plus their total count
    pub async fn list(
        &self,
        user: &AuthUser,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Category>, i64), ServiceError> {
        let repo = self.crud.repository();
        let items = repo.list_by_user(user.id, limit, offset).await?;
        let total = repo.count_by_user(user.id).await?;
        Ok((items, total))
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        id: Uuid,
        request: CategoryRequest,
    ) -> Result<Category, ServiceError> {
        let mut category = self.crud.get_owned(id, user.id).await?;
        category.name = request.name;
        category.description = request.description;
        category.updated_at = Utc::now();

        self.crud.update(category).await.map_err(store_conflict)
    }

    /// Soft-deleted costs and transactions go with the category; live ones block it
    pub async fn delete(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        self.crud.get_owned(id, user.id).await?;
        self.crud
            .repository()
            .delete_with_history(id)
            .await
            .map_err(|e| store_conflict(e.into()))
    }
}

fn store_conflict(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Database(DatabaseError::UniqueViolation(_)) => {
            ServiceError::Conflict("Category name already exists".to_string())
        }
        ServiceError::Database(DatabaseError::ForeignKeyViolation(_)) => ServiceError::Conflict(
            "Category is still referenced by costs or transactions".to_string(),
        ),
        other => other,
    }
}
