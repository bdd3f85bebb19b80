pub mod art;
pub mod config;
pub mod database;
pub mod executor;
pub mod storage;
pub mod types;
pub mod utils;

pub use config::{DatabaseConfig, DatabaseConfigBuilder};
pub use database::Database;
pub use executor::predicate::{ComparisonOp, Predicate, RowPredicate};
pub use storage::schema::{ColumnSchema, TableSchema};
pub use types::{
    RowId,
    error::{DatabaseError, Result},
    row::Row,
    value::{DataType, Value},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
