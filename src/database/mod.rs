pub mod manager;
pub mod models;
pub mod repositories;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager, HealthCheck};
pub use repository::{Entity, Owned, PgRepository, Repository};
