use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::repository::{Entity, Owned, PgQuery};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(user_id: Uuid, name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Category {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] =
        &["user_id", "name", "description", "created_at", "updated_at"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.user_id)
            .bind(&self.name)
            .bind(&self.description)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Owned for Category {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}
