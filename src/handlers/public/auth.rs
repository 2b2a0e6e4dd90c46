use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::User;
use crate::handlers::extract::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{LoginRequest, RegisterRequest};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// POST /api/v1/auth/register - create an account
///
/// Returns 201 with the new user (never the password hash), 400 on invalid
/// input, 409 when the email or username is taken.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<User> {
    let user = state.auth.register(request).await?;
    Ok(ApiResponse::created(user).with_message("User registered successfully"))
}

/// POST /api/v1/auth/login - exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let user = state.auth.login(request).await?;
    let token = state.tokens.issue(&user)?;

    tracing::info!("User {} logged in", user.id);
    Ok(ApiResponse::success(LoginResponse { user, token }).with_message("Login successful"))
}
