mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use nexo_api::auth::TokenService;
use nexo_api::database::models::User;

fn user() -> User {
    User::new(
        "alice".to_string(),
        "alice@example.com".to_string(),
        String::new(),
    )
}

#[tokio::test]
async fn protected_routes_reject_missing_tokens() -> Result<()> {
    let (app, _) = common::test_app()?;

    for uri in [
        "/api/v1/auth/whoami",
        "/api/v1/users",
        "/api/v1/categories",
        "/api/v1/costs",
        "/api/v1/transactions",
    ] {
        let (status, body) = common::send(&app, Method::GET, uri, None, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 401);
    }
    Ok(())
}

#[tokio::test]
async fn tokens_from_another_secret_are_rejected() -> Result<()> {
    let (app, _) = common::test_app()?;
    let foreign = TokenService::new("a-completely-different-signing-secret!!", 1)?;
    let token = foreign.issue(&user())?;

    let (status, body) =
        common::send(&app, Method::GET, "/api/v1/auth/whoami", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn whoami_reads_identity_from_the_token() -> Result<()> {
    let (app, config) = common::test_app()?;
    let tokens = TokenService::new(&config.security.jwt_secret, 1)?;
    let alice = user();
    let token = tokens.issue(&alice)?;

    let (status, body) =
        common::send(&app, Method::GET, "/api/v1/auth/whoami", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], alice.id.to_string());
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    Ok(())
}

#[tokio::test]
async fn register_validation_fails_before_the_database() -> Result<()> {
    let (app, _) = common::test_app()?;

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"username": "x", "email": "not-an-email", "password": "short"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["errors"]["email"].is_string());
    Ok(())
}

#[tokio::test]
async fn login_requires_a_well_formed_body() -> Result<()> {
    let (app, _) = common::test_app()?;

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "alice@example.com"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"]["password"], "is required");
    Ok(())
}
