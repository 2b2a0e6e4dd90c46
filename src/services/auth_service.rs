use std::sync::Arc;

use serde::Deserialize;
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::database::models::User;
use crate::services::{ServiceError, UserService};
use crate::validation::USERNAME_RE;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 50),
        regex(path = *USERNAME_RE, message = "must contain only letters and digits")
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Registration and credential checks on top of the user store
pub struct AuthService {
    users: Arc<UserService>,
}

impl AuthService {
    pub fn new(users: Arc<UserService>) -> Self {
        Self { users }
    }

    /// Verify credentials; unknown email and wrong password are indistinguishable.
    pub async fn login(&self, request: LoginRequest) -> Result<User, ServiceError> {
        request.validate()?;

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user.sanitized())
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ServiceError> {
        request.validate()?;

        self.users
            .ensure_available(Some(&request.email), Some(&request.username), None)
            .await?;

        let password_hash = hash_password(request.password, self.users.bcrypt_cost()).await?;
        let user = self
            .users
            .create(User::new(request.username, request.email, password_hash))
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::testing::{MemoryStore, TEST_SECRET};

    fn service() -> (Arc<MemoryStore>, AuthService) {
        let store = MemoryStore::new();
        let users = Arc::new(UserService::new(store.clone(), 4));
        (store, AuthService::new(users))
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_yields_valid_token() {
        let (store, auth) = service();
        let registered = auth
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();
        assert!(registered.password_hash.is_empty());

        let stored = store.user(registered.id).unwrap();
        assert_ne!(stored.password_hash, "password123");

        let user = auth
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(user.id, registered.id);
        assert!(user.password_hash.is_empty());

        let tokens = TokenService::new(TEST_SECRET, 24).unwrap();
        let claims = tokens.validate(&tokens.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.user_id, registered.id);
    }

    #[tokio::test]
    async fn duplicate_email_wins_over_duplicate_username() {
        let (_store, auth) = service();
        auth.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = auth
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyExists));

        let err = auth
            .register(register_request("someoneelse", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyExists));

        let err = auth
            .register(register_request("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UsernameTaken));
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let (_store, auth) = service();
        auth.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let wrong_password = auth
            .login(login_request("alice@example.com", "not-the-password"))
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(login_request("nobody@example.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert!(matches!(unknown_email, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn register_validates_before_any_lookup() {
        let (store, auth) = service();
        let err = auth
            .register(RegisterRequest {
                username: "a!".to_string(),
                email: "not-an-email".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.calls(), 0);
    }
}
