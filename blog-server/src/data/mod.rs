pub mod post_repository;
pub mod user_repository;

#[cfg(test)]
pub mod memory;

use crate::domain::error::DomainError;
use tracing::error;

/// Unique-index violations become `Conflict`, everything else is internal.
pub(crate) fn map_write_error(err: sqlx::Error, conflict_message: &str) -> DomainError {
    let unique_violation = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique_violation {
        DomainError::Conflict(conflict_message.to_string())
    } else {
        error!("database write failed: {}", err);
        DomainError::Internal(format!("database error: {}", err))
    }
}

pub(crate) fn map_read_error(err: sqlx::Error) -> DomainError {
    error!("database read failed: {}", err);
    DomainError::Internal(format!("database error: {}", err))
}
