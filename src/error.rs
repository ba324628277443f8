//! Unified error handling for restrictd.
//!
//! Logical no-ops (already imposed, not restricted, already resolved) are
//! success-typed outcomes, not errors. Only the failures below abort an
//! operation.

use crate::adapter::AdapterError;
use crate::db::DbError;
use thiserror::Error;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested expiry is not strictly in the future. Nothing was written.
    #[error("expiry must be strictly in the future")]
    InvalidDuration,

    /// The platform call failed or timed out.
    ///
    /// With `store_committed == false` the store is exactly as it was before
    /// the operation, so a retry is safe. With `store_committed == true` the
    /// records no longer match the platform: after lift/expire they are
    /// already gone and only the revoke needs retrying; after impose the
    /// marker could not be rolled back and `reapply` or `lift` repairs it.
    #[error("capability adapter failed: {source}")]
    Adapter {
        source: AdapterError,
        store_committed: bool,
    },

    /// Store failure. No record was changed by the failing write. A grant made
    /// by `impose_timed` for a previously absent key has been revoked again.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl EngineError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDuration => "invalid_duration",
            Self::Adapter {
                store_committed: false,
                ..
            } => "adapter_error",
            Self::Adapter {
                store_committed: true,
                ..
            } => "adapter_stale",
            Self::Store(_) => "store_error",
        }
    }

    /// The restriction records were changed even though the call failed.
    pub fn is_store_committed(&self) -> bool {
        matches!(
            self,
            Self::Adapter {
                store_committed: true,
                ..
            }
        )
    }

    pub(crate) fn adapter(source: AdapterError, store_committed: bool) -> Self {
        Self::Adapter {
            source,
            store_committed,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
