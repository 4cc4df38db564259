use thiserror::Error;

/// Custom error type for schema synchronization operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Error that occurs during database interactions (e.g., a catalog query failure).
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// Connection error (e.g., issues with network or database connection).
    #[error("Connection error: {0}")]
    Connection(String),
    /// Configuration error (e.g., invalid database URL or missing parameters).
    #[error("Configuration error: {0}")]
    Config(String),
    /// Transaction error (e.g., failed to commit or rollback a transaction).
    #[error("Transaction error: {0}")]
    Transaction(String),
    /// A native column type the mapper cannot canonicalize.
    #[error("Type mapping error: {0}")]
    Mapping(String),
    /// Catalog metadata that contradicts itself within one introspection pass.
    #[error("Schema inconsistency: {0}")]
    Inconsistency(String),
    /// A statement of a migration script failed and the transaction was rolled back.
    #[error("Apply error in `{statement}`: {reason}")]
    Apply { statement: String, reason: String },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
