use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, AuthUser};
use crate::database::models::User;
use crate::database::repositories::UserRepository;
use crate::database::DatabaseError;
use crate::services::{CrudService, ServiceError};
use crate::validation::USERNAME_RE;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 3, max = 50),
        regex(path = *USERNAME_RE, message = "must contain only letters and digits")
    )]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 72))]
    pub password: Option<String>,
}

pub struct UserService {
    crud: CrudService<User, dyn UserRepository>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self {
            crud: CrudService::new(repo),
            bcrypt_cost,
        }
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ServiceError> {
        Ok(self.crud.get(id).await?.sanitized())
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, ServiceError> {
        let users = self.crud.list(limit, offset).await?;
        Ok(users.into_iter().map(User::sanitized).collect())
    }

    /// Lookup used by login; keeps the hash so it can be verified.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.crud.repository().find_by_email(email).await?)
    }

    /// Persist a new user; the password must already be hashed.
    pub async fn create(&self, user: User) -> Result<User, ServiceError> {
        let user = self.crud.create(user).await.map_err(collision)?;
        Ok(user.sanitized())
    }

    /// Fail with the collision error for a taken email, then a taken username.
    ///
    /// `except` excludes the caller's own record when checking updates.
    pub async fn ensure_available(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let repo = self.crud.repository();
        let is_other = |user: &User| Some(user.id) != except;

        if let Some(email) = email {
            if repo.find_by_email(email).await?.filter(is_other).is_some() {
                return Err(ServiceError::EmailAlreadyExists);
            }
        }
        if let Some(username) = username {
            if repo.find_by_username(username).await?.filter(is_other).is_some() {
                return Err(ServiceError::UsernameTaken);
            }
        }
        Ok(())
    }

    /// Update the caller's own profile; other users' profiles are off limits.
    pub async fn update_profile(
        &self,
        caller: &AuthUser,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<User, ServiceError> {
        request.validate()?;
        if caller.id != id {
            return Err(ServiceError::Unauthorized);
        }

        let mut user = self.crud.get(id).await?;
        let email = request.email.filter(|e| *e != user.email);
        let username = request.username.filter(|u| *u != user.username);
        self.ensure_available(email.as_deref(), username.as_deref(), Some(id))
            .await?;

        if let Some(email) = email {
            user.email = email;
        }
        if let Some(username) = username {
            user.username = username;
        }
        if let Some(password) = request.password {
            user.password_hash = hash_password(password, self.bcrypt_cost).await?;
        }
        user.updated_at = Utc::now();

        let user = self.crud.update(user).await.map_err(collision)?;
        Ok(user.sanitized())
    }
}

/// Map a unique-constraint race on the users table to the matching collision error
fn collision(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Database(DatabaseError::UniqueViolation(constraint)) => {
            if constraint.contains("username") {
                ServiceError::UsernameTaken
            } else {
                ServiceError::EmailAlreadyExists
            }
        }
        other => other,
    }
}
