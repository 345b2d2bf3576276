pub mod config;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod store;

pub use config::DatabaseConfig;
pub use pool::DatabasePool;
pub use store::PgCandleStore;

use candle_core::CandleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Duplicate candle: {0}")]
    Conflict(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DatabaseError::Conflict(db_err.message().to_string());
            }
        }
        DatabaseError::Query(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::Migration(err.to_string())
    }
}

impl From<DatabaseError> for CandleError {
    fn from(err: DatabaseError) -> Self {
        CandleError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
