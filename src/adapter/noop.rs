//! Dry-run adapter that only logs.
//!
//! Used when no platform bridge is configured. Every call succeeds.

use super::{AdapterError, CapabilityAdapter};
use crate::restriction::{RestrictionKind, SubjectId};
use async_trait::async_trait;
use tracing::info;

pub struct NoopAdapter;

#[async_trait]
impl CapabilityAdapter for NoopAdapter {
    async fn grant(&self, subject: SubjectId, kind: RestrictionKind) -> Result<(), AdapterError> {
        info!(subject = %subject, capability = kind.capability_name(), "dry-run grant");
        Ok(())
    }

    async fn revoke(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<(), AdapterError> {
        info!(subject = %subject, capability = kind.capability_name(), "dry-run revoke");
        Ok(())
    }
}
