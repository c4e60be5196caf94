//! Error types for schemalens

use thiserror::Error;

/// Core error type for schemalens operations
#[derive(Error, Debug)]
pub enum SchemaLensError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The vendor reported a native type that the dialect's type map does not cover.
    #[error("Unsupported {dialect} type: {native_type}")]
    UnsupportedType {
        dialect: String,
        native_type: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

impl SchemaLensError {
    /// Build a `NotFound` error for a table name
    pub fn table_not_found(table: &str) -> Self {
        SchemaLensError::NotFound(format!("Table '{}' not found", table))
    }

    /// Whether the error means the referenced object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaLensError::NotFound(_))
    }
}

/// Result type alias for schemalens operations
pub type Result<T> = std::result::Result<T, SchemaLensError>;
