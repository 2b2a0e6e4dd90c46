use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/v1/auth/whoami - identity carried by the presented token
pub async fn whoami(user: AuthUser) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
