pub mod category;
pub mod cost;
pub mod transaction;
pub mod user;

pub use category::Category;
pub use cost::{Cost, CostWithCategory};
pub use transaction::{Transaction, TransactionType, TransactionWithCategory, UnknownTransactionType};
pub use user::User;
