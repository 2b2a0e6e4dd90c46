pub mod category;
pub mod cost;
pub mod transaction;
pub mod user;

pub use category::CategoryRepository;
pub use cost::{CostFilter, CostRepository};
pub use transaction::TransactionRepository;
pub use user::UserRepository;
