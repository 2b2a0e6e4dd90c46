use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::repository::{Entity, PgQuery};
use crate::validation::USERNAME_RE;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[validate(
        length(min = 3, max = 50),
        regex(path = *USERNAME_RE, message = "must contain only letters and digits")
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Drop the password hash before the user leaves the service layer
    pub fn sanitized(mut self) -> Self {
        self.password_hash.clear();
        self
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] =
        &["username", "email", "password_hash", "created_at", "updated_at"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.username)
            .bind(&self.email)
            .bind(&self.password_hash)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}
