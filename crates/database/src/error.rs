use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Rejected invalid data: {0}")]
    Validation(#[from] CoreError),

    #[error("Stored row could not be decoded: {0}")]
    InvalidData(String),

    #[error("A hospital is already registered for this owner.")]
    AlreadyExists,

    #[error("The requested data was not found in the database.")]
    NotFound,
}
