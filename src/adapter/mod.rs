//! Capability adapter abstraction.
//!
//! The adapter makes a restriction observable on the platform by granting or
//! revoking the capability named by [`RestrictionKind::capability_name`].
//! Implementations must be idempotent: granting an already-granted capability
//! or revoking an absent one succeeds.

use crate::restriction::{RestrictionKind, SubjectId};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod noop;
pub mod webhook;

pub use noop::NoopAdapter;
pub use webhook::WebhookAdapter;

/// Platform-side failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("platform refused the capability change")]
    Forbidden,
    #[error("subject not found on platform: {0}")]
    NotFound(SubjectId),
    #[error("platform rejected request with status {status}")]
    Rejected { status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("adapter call timed out after {0:?}")]
    Timeout(Duration),
}

impl AdapterError {
    /// Static label for metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Rejected { .. } => "rejected",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
        }
    }
}

#[async_trait]
pub trait CapabilityAdapter: Send + Sync {
    /// Apply the platform effect of `kind` to `subject`.
    async fn grant(&self, subject: SubjectId, kind: RestrictionKind) -> Result<(), AdapterError>;

    /// Remove the platform effect of `kind` from `subject`.
    async fn revoke(&self, subject: SubjectId, kind: RestrictionKind)
    -> Result<(), AdapterError>;
}
