pub mod auth_service;
pub mod base;
pub mod category_service;
pub mod cost_service;
pub mod transaction_service;
pub mod user_service;

use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::PasswordError;
use crate::database::DatabaseError;

pub use auth_service::{AuthService, LoginRequest, RegisterRequest};
pub use base::CrudService;
pub use category_service::{CategoryRequest, CategoryService};
pub use cost_service::{CostService, CreateCostRequest, UpdateCostRequest};
pub use transaction_service::{
    CreateTransactionRequest, TransactionService, UpdateTransactionRequest,
};
pub use user_service::{UpdateUserRequest, UserService};

/// Domain errors returned by every service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("resource not found")]
    NotFound,

    #[error("unauthorized access")]
    Unauthorized,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("email already exists")]
    EmailAlreadyExists,

    #[error("username already taken")]
    UsernameTaken,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(DatabaseError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => ServiceError::NotFound,
            other => ServiceError::Database(other),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Resolve a 1-based page into the row offset for `limit`-sized pages
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.max(1).saturating_sub(1).saturating_mul(limit)
}
