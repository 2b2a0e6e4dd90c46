// Request extractors that reject with the API error envelope instead of axum's plain-text bodies
use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

static MISSING_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"missing field `([^`]+)`").unwrap());

/// JSON body; malformed or mistyped payloads become 400 `INVALID_JSON`,
/// while a missing required field is reported as a `VALIDATION_ERROR` for that field.
///
/// Field constraints are checked by the service layer, which owns the rules.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(body_rejection)?;
        Ok(Self(value))
    }
}

fn body_rejection(rejection: JsonRejection) -> ApiError {
    let detail = rejection.body_text();
    tracing::debug!("Rejected request body: {}", detail);

    if matches!(rejection, JsonRejection::JsonDataError(_)) {
        if let Some(field) = missing_field(&detail) {
            let errors = HashMap::from([(field.to_string(), "is required".to_string())]);
            return ApiError::validation_error("Invalid input provided", Some(errors));
        }
    }
    ApiError::invalid_json(detail)
}

/// JSON name of the field serde reported as missing
fn missing_field(detail: &str) -> Option<&str> {
    MISSING_FIELD_RE
        .captures(detail)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Query string deserialized and validated before the handler runs
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// `:id` path segment parsed as a UUID
pub struct EntityId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid id: expected a UUID"))?;
        Ok(Self(id))
    }
}
