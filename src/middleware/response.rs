use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: Option<String>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
            status_code: None,
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            message: None,
            status_code: Some(status_code),
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Create a 204 No Content response
    pub fn no_content() -> Self {
        Self::with_status((), StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        // For 204 No Content, return empty response
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal_server_error("Internal server error").into_response();
            }
        };

        let mut envelope = json!({
            "status": status.as_u16(),
            "success": true,
            "data": data_value,
        });
        if let Some(message) = self.message {
            envelope["message"] = Value::String(message);
        }

        (status, Json(envelope)).into_response()
    }
}

/// Paginated list envelope; items sit at the top level instead of under `data`
#[derive(Debug)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        let items = match serde_json::to_value(&self.items) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response items: {}", e);
                return ApiError::internal_server_error("Internal server error").into_response();
            }
        };

        Json(json!({
            "status": StatusCode::OK.as_u16(),
            "success": true,
            "items": items,
            "total": self.total,
            "page": self.page,
            "limit": self.limit,
        }))
        .into_response()
    }
}

// Convenience type aliases
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
pub type PageResult<T> = Result<Paginated<T>, ApiError>;

/// Wrap the empty 408 emitted by the timeout layer in the error envelope
pub async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE)
    {
        return ApiError::request_timeout("Request timed out").into_response();
    }
    response
}
