use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid record: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Failed to encode payload: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i64, supported: i64 },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;
