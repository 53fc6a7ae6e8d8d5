//! # Storage Errors

use shop_core::ShopError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// True for a `UNIQUE` constraint failure
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

impl From<DbError> for ShopError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, key } => ShopError::NotFound { entity, key },
            DbError::Conflict(msg) => ShopError::Conflict(msg),
            DbError::Invalid(msg) => ShopError::Validation(msg),
            other => ShopError::Storage(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
