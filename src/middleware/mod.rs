pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{timeout_envelope, ApiResponse, ApiResult, PageResult, Paginated};
