use crate::application::ports::StoreError;
use crate::domain::JobStatus;

/// Client-facing failures of the command and read paths. Stage
/// processing never surfaces through this type; stage outcomes are
/// only observable via the status queries.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("wrong state: expected {expected}, job is {actual}")]
    WrongState {
        expected: &'static str,
        actual: JobStatus,
    },
    #[error("store: {0}")]
    Store(#[from] StoreError),
}
