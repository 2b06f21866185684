use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that abort an invocation.
///
/// Everything else (malformed store, rejected joins, status page writes, failed
/// notifications) is absorbed into the state or the logs.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The new arena state could not be persisted; the event would otherwise be lost.
    #[error("failed to persist game state")]
    StoreWrite(#[source] StorageError),
    /// The inbound trigger could not be turned into an event.
    #[error("invalid trigger: {0}")]
    InvalidTrigger(String),
}

impl From<ValidationErrors> for DispatchError {
    fn from(err: ValidationErrors) -> Self {
        DispatchError::InvalidTrigger(format!("validation failed: {err}"))
    }
}
