use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
    #[error("Failed to connect to store: {0}")]
    Connect(#[source] DbErr),
    #[error("Store operation failed: {0}")]
    Operation(#[from] DbErr),
    #[error("Schema setup failed: {0}")]
    Schema(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the error came from the store being unreachable rather than from a rejected statement.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            StoreError::Connect(_)
                | StoreError::Unavailable(_)
                | StoreError::Operation(DbErr::Conn(_))
                | StoreError::Operation(DbErr::ConnectionAcquire(_))
        )
    }
}
