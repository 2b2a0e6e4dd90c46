use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use nexo_api::app::{app, AppState};
use nexo_api::config::AppConfig;
use nexo_api::database::DatabaseManager;

pub const TEST_SECRET: &str = "integration-signing-secret-0123456789";

/// Configuration pointing at a port nothing listens on, so any query fails fast
pub fn config() -> Result<AppConfig> {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP_ENV", "development"),
        ("JWT_SECRET", TEST_SECRET),
        ("DB_HOST", "127.0.0.1"),
        ("DB_PORT", "1"),
        ("DATABASE_CONNECTION_TIMEOUT", "1"),
        ("BCRYPT_COST", "4"),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .context("test configuration should be valid")
}

/// The full application over a pool that only connects on first use
pub fn test_app() -> Result<(Router, AppConfig)> {
    let config = config()?;
    let db = DatabaseManager::connect_lazy(&config.database);
    let state = AppState::postgres(&config, &db).context("failed to build state")?;
    Ok((app(state, &config.server), config))
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body)?).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}
