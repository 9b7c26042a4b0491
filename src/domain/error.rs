use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Backing service unreachable. Retryable by the caller.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Dimension or metric mismatch. Needs operator intervention.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
