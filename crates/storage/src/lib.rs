pub mod action_log;
pub mod error;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use action_log::{ActionLog, LogBounds, LogRead};
pub use error::StorageError;
pub use sqlite::SqliteLocalStore;
pub use traits::*;
