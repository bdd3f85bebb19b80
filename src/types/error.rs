use thiserror::Error;

use crate::types::{PageId, RowId};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Table '{name}' already exists")]
    TableAlreadyExists { name: String },

    #[error("Primary key column '{column}' not found in table '{table}'")]
    PrimaryKeyColumnNotFound { column: String, table: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Unknown column '{name}' for table '{table}'")]
    UnknownColumn { name: String, table: String },

    #[error("Missing value for NOT NULL column '{name}' in table '{table}'")]
    MissingRequiredColumn { name: String, table: String },

    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported operator: {op}")]
    UnsupportedOperator { op: String },

    #[error("Row {row_id} not found in table '{table}'")]
    RowNotFound { table: String, row_id: RowId },

    #[error("Index not found for table '{table}'")]
    IndexNotFound { table: String },

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },

    #[error("Corrupted data: page_id={page_id}, reason={reason}")]
    CorruptData { page_id: PageId, reason: String },

    #[error("Invalid page size: {size} bytes (allowed {min}..={max})")]
    InvalidPageSize { size: usize, min: usize, max: usize },

    #[error("Invalid page type: {0}")]
    InvalidPageType(u8),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
