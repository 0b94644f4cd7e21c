//! Error types for Token Verification
//!
//! Rejections (unknown token, expired token, duplicate scan) are outcomes,
//! not errors. The only error that crosses the service boundary is a store
//! that could not answer.

use super::pipeline::ScanStage;
use thiserror::Error;

/// Errors raised by storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or the operation did not complete.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Lock contention did not clear within the retry budget.
    #[error("write conflict on {key} after {attempts} attempts")]
    ConflictRetriesExhausted { key: String, attempts: u32 },

    /// A stored value could not be decoded.
    #[error("corrupt record under {key}: {message}")]
    Corrupt { key: String, message: String },

    /// Registration tried to reuse a credential already issued.
    #[error("credential already issued: {0}")]
    DuplicateCredential(String),

    /// Registration referenced an entity that does not exist.
    #[error("unknown {entity}: {id}")]
    MissingReference { entity: &'static str, id: String },
}

/// Errors returned by the verification service.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// No decision could be made safely. The scan was neither accepted nor
    /// rejected; callers may retry with backoff.
    #[error("storage unavailable at {stage}: {source}")]
    StorageUnavailable {
        stage: ScanStage,
        #[source]
        source: StoreError,
    },

    /// The detached pipeline task panicked or was cancelled by the runtime.
    #[error("verification task aborted: {0}")]
    TaskAborted(String),
}

impl VerificationError {
    pub fn storage(stage: ScanStage, source: StoreError) -> Self {
        VerificationError::StorageUnavailable { stage, source }
    }

    /// Only storage outages warrant a retry; rejections are final answers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerificationError::StorageUnavailable { .. })
    }
}
