//! Error types shared across the crate

use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    /// Preferences could not be located, read, or written
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Persisted engine state could not be written
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Asset store error: {0}")]
    Store(#[from] StoreError),

    /// The store declined the batch delete, or the user cancelled its prompt
    #[error("Deletion did not complete: {0}")]
    DeleteRequestFailed(String),

    /// A delete request is already outstanding, or was abandoned and not yet
    /// settled through `TriageEngine::recover_deletion`
    #[error("A deletion is already in progress")]
    DeletionInFlight,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
