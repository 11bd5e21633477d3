//! Database-specific error types and conversions.

use casalink_core::error::CasalinkError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A compare-and-swap write found a stale version.
    #[error("Stale version for {entity} {id}: expected {expected}")]
    StaleVersion {
        entity: String,
        id: String,
        expected: u64,
    },

    #[error("Corrupt row in {entity}: {message}")]
    CorruptRow { entity: String, message: String },
}

impl From<DbError> for CasalinkError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CasalinkError::NotFound { entity, id },
            DbError::StaleVersion { .. } => CasalinkError::Conflict {
                message: err.to_string(),
            },
            other => CasalinkError::Database(other.to_string()),
        }
    }
}
