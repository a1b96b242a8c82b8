pub mod database;
pub mod error;
pub mod row_helpers;
pub mod schema;
pub mod tasks;

pub use database::Database;
pub use error::StoreError;
pub use tasks::TaskRepo;
