pub mod activation_repository;
pub mod user_repository;

pub use activation_repository::{ActivationRepository, SqliteActivationRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    #[error("Lifetime of {0} minutes is out of range")]
    InvalidTtl(i64),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

// Fixed-width UTC timestamps so that SQL string comparison matches chronological order.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Corrupt(format!("bad timestamp {:?}: {}", value, e)))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
