use sim_core::CoreError;
use thiserror::Error;

/// Storage backend failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("sqlite error: {0}")]
    Sqlite(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Sqlite(e.to_string())
    }
}

/// Why a save could not be written or read back.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PersistError {
    /// The save was written by a newer build.
    #[error("save version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    /// An upgrade's production payload is missing or corrupt.
    #[error("invalid effect on upgrade {upgrade}: {reason}")]
    InvalidUpgradeEffect { upgrade: String, reason: String },
    /// The restored entities break an invariant.
    #[error("invalid state: {0}")]
    InvalidState(#[from] CoreError),
    #[error("malformed save document: {0}")]
    Json(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Json(e.to_string())
    }
}
