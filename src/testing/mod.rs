// In-memory stores and fixtures for exercising services and routes without Postgres
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{AuthUser, TokenService};
use crate::database::models::{
    Category, Cost, CostWithCategory, Transaction, TransactionWithCategory, User,
};
use crate::database::repositories::{
    CategoryRepository, CostFilter, CostRepository, TransactionRepository, UserRepository,
};
use crate::database::{DatabaseError, Entity, HealthCheck, Repository};

pub const TEST_SECRET: &str = "test-signing-secret-that-is-long-enough";

/// Minimum bcrypt cost keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    categories: RwLock<HashMap<Uuid, Category>>,
    costs: RwLock<HashMap<Uuid, Cost>>,
    transactions: RwLock<HashMap<Uuid, Transaction>>,
    calls: AtomicUsize,
    unhealthy: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of repository operations served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.read().unwrap().get(&id).cloned()
    }

    pub fn cost(&self, id: Uuid) -> Option<Cost> {
        self.costs.read().unwrap().get(&id).cloned()
    }

    pub fn seed_category(&self, owner: &AuthUser, name: &str) -> Category {
        let category = Category::new(owner.id, name.to_string(), None);
        self.categories
            .write()
            .unwrap()
            .insert(category.id, category.clone());
        category
    }

    pub fn seed_cost(&self, owner: &AuthUser, category_id: Uuid, incurred_at: &str) -> Cost {
        let incurred_at = DateTime::parse_from_rfc3339(incurred_at)
            .unwrap()
            .with_timezone(&Utc);
        let cost = Cost::new(
            owner.id,
            category_id,
            "Seeded".to_string(),
            Decimal::ONE,
            "USD".to_string(),
            incurred_at,
        );
        self.costs.write().unwrap().insert(cost.id, cost.clone());
        cost
    }

    fn category_name(&self, id: Uuid) -> Option<String> {
        self.categories
            .read()
            .unwrap()
            .get(&id)
            .map(|c| c.name.clone())
    }
}

/// Per-table hooks standing in for the constraints Postgres enforces
pub trait MemoryEntity: Entity {
    fn table(store: &MemoryStore) -> &RwLock<HashMap<Uuid, Self>>;

    fn created(&self) -> DateTime<Utc>;

    fn is_live(&self) -> bool {
        true
    }

    /// Returns false when the table hard-deletes.
    fn mark_deleted(&mut self, _at: DateTime<Utc>) -> bool {
        false
    }

    fn clashes_with(&self, _other: &Self) -> Option<&'static str> {
        None
    }

    fn is_referenced(_store: &MemoryStore, _id: Uuid) -> bool {
        false
    }
}

impl MemoryEntity for User {
    fn table(store: &MemoryStore) -> &RwLock<HashMap<Uuid, Self>> {
        &store.users
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn clashes_with(&self, other: &Self) -> Option<&'static str> {
        if self.email == other.email {
            Some("users_email_key")
        } else if self.username == other.username {
            Some("users_username_key")
        } else {
            None
        }
    }
}

impl MemoryEntity for Category {
    fn table(store: &MemoryStore) -> &RwLock<HashMap<Uuid, Self>> {
        &store.categories
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn clashes_with(&self, other: &Self) -> Option<&'static str> {
        (self.user_id == other.user_id && self.name == other.name)
            .then_some("categories_user_id_name_key")
    }

    fn is_referenced(store: &MemoryStore, id: Uuid) -> bool {
        let costs = store.costs.read().unwrap();
        let transactions = store.transactions.read().unwrap();
        costs.values().any(|c| c.category_id == id && c.is_live())
            || transactions.values().any(|t| t.category_id == id && t.is_live())
    }
}

impl MemoryEntity for Cost {
    fn table(store: &MemoryStore) -> &RwLock<HashMap<Uuid, Self>> {
        &store.costs
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) -> bool {
        self.deleted_at = Some(at);
        true
    }
}

impl MemoryEntity for Transaction {
    fn table(store: &MemoryStore) -> &RwLock<HashMap<Uuid, Self>> {
        &store.transactions
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) -> bool {
        self.deleted_at = Some(at);
        true
    }
}

fn not_found<T: Entity>() -> DatabaseError {
    DatabaseError::NotFound(format!("{} record not found", T::TABLE))
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl<T: MemoryEntity> Repository<T> for MemoryStore {
    async fn create(&self, entity: &T) -> Result<(), DatabaseError> {
        self.touch();
        let mut rows = T::table(self).write().unwrap();
        if let Some(constraint) = rows.values().find_map(|row| entity.clashes_with(row)) {
            return Err(DatabaseError::UniqueViolation(constraint.to_string()));
        }
        rows.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.touch();
        T::table(self)
            .read()
            .unwrap()
            .get(&id)
            .filter(|row| row.is_live())
            .cloned()
            .ok_or_else(not_found::<T>)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, DatabaseError> {
        self.touch();
        let mut rows: Vec<T> = T::table(self)
            .read()
            .unwrap()
            .values()
            .filter(|row| row.is_live())
            .cloned()
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.created()));
        Ok(page(rows, limit, offset))
    }

    async fn update(&self, entity: &T) -> Result<(), DatabaseError> {
        self.touch();
        let mut rows = T::table(self).write().unwrap();
        if !rows.get(&entity.id()).is_some_and(|row| row.is_live()) {
            return Err(not_found::<T>());
        }
        if let Some(constraint) = rows
            .values()
            .filter(|row| row.id() != entity.id())
            .find_map(|row| entity.clashes_with(row))
        {
            return Err(DatabaseError::UniqueViolation(constraint.to_string()));
        }
        rows.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.touch();
        if T::is_referenced(self, id) {
            return Err(DatabaseError::ForeignKeyViolation(format!(
                "{}_referenced",
                T::TABLE
            )));
        }
        let mut rows = T::table(self).write().unwrap();
        let row = rows
            .get_mut(&id)
            .filter(|row| row.is_live())
            .ok_or_else(not_found::<T>)?;
        if !row.mark_deleted(Utc::now()) {
            rows.remove(&id);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.touch();
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        self.touch();
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, DatabaseError> {
        self.touch();
        let mut rows: Vec<Category> = self
            .categories
            .read()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page(rows, limit, offset))
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        self.touch();
        let categories = self.categories.read().unwrap();
        Ok(categories.values().filter(|c| c.user_id == user_id).count() as i64)
    }

    async fn delete_with_history(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.touch();
        if Category::is_referenced(self, id) {
            return Err(DatabaseError::ForeignKeyViolation(
                "categories_live_references".to_string(),
            ));
        }
        self.costs.write().unwrap().retain(|_, c| c.category_id != id);
        self.transactions
            .write()
            .unwrap()
            .retain(|_, t| t.category_id != id);
        self.categories
            .write()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(not_found::<Category>)
    }
}

impl MemoryStore {
    fn live_costs(&self, user_id: Uuid, filter: &CostFilter) -> Vec<Cost> {
        self.costs
            .read()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id && c.is_live() && filter.matches(c.incurred_at))
            .cloned()
            .collect()
    }

    fn live_transactions(&self, user_id: Uuid) -> Vec<Transaction> {
        self.transactions
            .read()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id && t.is_live())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CostRepository for MemoryStore {
    async fn list_with_category(
        &self,
        user_id: Uuid,
        filter: &CostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CostWithCategory>, DatabaseError> {
        self.touch();
        let mut rows = self.live_costs(user_id, filter);
        rows.sort_by_key(|c| std::cmp::Reverse(c.incurred_at));
        Ok(page(rows, limit, offset)
            .into_iter()
            .map(|cost| CostWithCategory {
                category_name: self.category_name(cost.category_id),
                cost,
            })
            .collect())
    }

    async fn count_by_user(&self, user_id: Uuid, filter: &CostFilter) -> Result<i64, DatabaseError> {
        self.touch();
        Ok(self.live_costs(user_id, filter).len() as i64)
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionWithCategory>, DatabaseError> {
        self.touch();
        let mut rows = self.live_transactions(user_id);
        rows.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(page(rows, limit, offset)
            .into_iter()
            .map(|transaction| TransactionWithCategory {
                category_name: self.category_name(transaction.category_id),
                transaction,
            })
            .collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        self.touch();
        Ok(self.live_transactions(user_id).len() as i64)
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

pub fn auth_user(username: &str) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(TEST_SECRET, 24).unwrap()
}

/// Application state wired entirely to one in-memory store
pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    AppState::from_repositories(
        token_service(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        TEST_BCRYPT_COST,
    )
}
