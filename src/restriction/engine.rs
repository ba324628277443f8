//! Restriction reconciliation engine.
//!
//! Every operation follows the same shape: take the per-key lock, classify the
//! key from fresh store reads, write the store, then drive the capability
//! adapter. The permanent marker is the durability anchor; a timed entry is
//! only a scheduling annotation on top of it, so the engine never leaves a
//! timed entry without a marker.
//!
//! | state       | impose               | impose_timed      | lift / expire      |
//! |-------------|----------------------|-------------------|--------------------|
//! | `Absent`    | marker + grant       | grant + both rows | no-op              |
//! | `Permanent` | no-op                | grant + timed row | clear + revoke     |
//! | `Timed`     | drop timed, no grant | grant + overwrite | clear + revoke     |

use super::length::parse_length;
use super::locks::KeyLocks;
use super::outcome::{
    ActiveRestriction, ExpireOutcome, ImposeOutcome, ImposeTimedOutcome, LiftOutcome,
    ReapplyReport, RestrictionState,
};
use super::{Clock, RestrictionKind, SubjectId, Timestamp};
use crate::adapter::{AdapterError, CapabilityAdapter};
use crate::error::{EngineError, EngineResult};
use crate::metrics;
use crate::store::RestrictionStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Upper bound on a single grant/revoke while the key lock is held.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Engine {
    store: Arc<dyn RestrictionStore>,
    adapter: Arc<dyn CapabilityAdapter>,
    clock: Arc<dyn Clock>,
    locks: KeyLocks,
    adapter_timeout: Duration,
}

impl Engine {
    pub fn new(
        store: Arc<dyn RestrictionStore>,
        adapter: Arc<dyn CapabilityAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            adapter,
            clock,
            locks: KeyLocks::new(),
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn store(&self) -> &Arc<dyn RestrictionStore> {
        &self.store
    }

    /// Current state of a key.
    pub async fn state(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> EngineResult<RestrictionState> {
        let _guard = self.locks.acquire(subject, kind).await;
        self.classify(subject, kind).await
    }

    /// Impose an indefinite restriction.
    pub async fn impose(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> EngineResult<ImposeOutcome> {
        let _guard = self.locks.acquire(subject, kind).await;

        let outcome = match self.classify(subject, kind).await? {
            RestrictionState::Absent => {
                self.store
                    .insert_permanent(subject, kind, self.clock.now())
                    .await?;
                if let Err(e) = self.grant(subject, kind).await {
                    let restored = self.rollback_marker(subject, kind).await;
                    return Err(self.adapter_failed("impose", subject, kind, e, !restored));
                }
                ImposeOutcome::NewlyImposed
            }
            RestrictionState::Timed { expires_at } => {
                // Re-anchor first in case the marker went missing underneath us.
                self.store
                    .insert_permanent(subject, kind, self.clock.now())
                    .await?;
                self.store.delete_timed(subject, kind).await?;
                ImposeOutcome::UpgradedFromTimed {
                    previous_expiry: expires_at,
                }
            }
            RestrictionState::Permanent => ImposeOutcome::AlreadyImposed,
        };

        let changed = outcome != ImposeOutcome::AlreadyImposed;
        self.record("impose", subject, kind, outcome.label(), changed);
        Ok(outcome)
    }

    /// Impose a restriction that lifts itself at `expires_at`.
    ///
    /// The grant goes first and is unconditional; a failure leaves the store
    /// untouched. Marker and expiry are then written as one unit. If that
    /// write fails on a previously absent key, the grant is revoked again.
    pub async fn impose_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
    ) -> EngineResult<ImposeTimedOutcome> {
        let now = self.clock.now();
        if expires_at <= now {
            metrics::record_operation("impose_timed", kind, "invalid_duration");
            return Err(EngineError::InvalidDuration);
        }

        let _guard = self.locks.acquire(subject, kind).await;
        let prior = self.classify(subject, kind).await?;

        if let Err(e) = self.grant(subject, kind).await {
            return Err(self.adapter_failed("impose_timed", subject, kind, e, false));
        }

        let outcome = match self
            .store
            .schedule_timed(subject, kind, expires_at, now)
            .await
        {
            Ok(Some(previous_expiry)) => ImposeTimedOutcome::Updated { previous_expiry },
            Ok(None) => ImposeTimedOutcome::NewlyImposed,
            Err(e) => {
                warn!(subject = %subject, kind = %kind, error = %e, "Failed to store timed restriction");
                if !prior.is_active() {
                    self.undo_grant(subject, kind).await;
                }
                metrics::record_operation("impose_timed", kind, "store_error");
                return Err(e.into());
            }
        };

        info!(
            subject = %subject,
            kind = %kind,
            expires_at,
            outcome = outcome.label(),
            "Timed restriction imposed"
        );
        metrics::record_operation("impose_timed", kind, outcome.label());
        Ok(outcome)
    }

    /// Impose a timed restriction from an operator length such as `2h30m`.
    pub async fn impose_for(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        length: &str,
    ) -> EngineResult<(ImposeTimedOutcome, Timestamp)> {
        let secs = parse_length(length).ok_or(EngineError::InvalidDuration)?;
        let expires_at = self
            .clock
            .now()
            .checked_add(secs)
            .ok_or(EngineError::InvalidDuration)?;

        let outcome = self.impose_timed(subject, kind, expires_at).await?;
        Ok((outcome, expires_at))
    }

    /// Lift a restriction on operator request.
    ///
    /// A revoke failure is reported with `store_committed` set: the records
    /// are already gone and are not restored.
    pub async fn lift(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> EngineResult<LiftOutcome> {
        let _guard = self.locks.acquire(subject, kind).await;

        let cleared = self.store.clear(subject, kind).await?;
        if cleared.is_empty() {
            self.record("lift", subject, kind, LiftOutcome::NotRestricted.label(), false);
            return Ok(LiftOutcome::NotRestricted);
        }

        if let Err(e) = self.revoke(subject, kind).await {
            return Err(self.adapter_failed("lift", subject, kind, e, true));
        }

        self.record("lift", subject, kind, LiftOutcome::Lifted.label(), true);
        Ok(LiftOutcome::Lifted)
    }

    /// Lift a timed restriction whose expiry has passed.
    ///
    /// Safe against racing lifts and updates: if the timed entry is gone or
    /// now expires later, nothing is touched.
    pub async fn expire(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> EngineResult<ExpireOutcome> {
        let _guard = self.locks.acquire(subject, kind).await;

        let now = self.clock.now();
        match self.store.get_timed(subject, kind).await? {
            Some(expires_at) if expires_at <= now => {}
            _ => {
                let outcome = ExpireOutcome::AlreadyResolved.label();
                self.record("expire", subject, kind, outcome, false);
                return Ok(ExpireOutcome::AlreadyResolved);
            }
        }

        self.store.clear(subject, kind).await?;

        if let Err(e) = self.revoke(subject, kind).await {
            return Err(self.adapter_failed("expire", subject, kind, e, true));
        }

        self.record("expire", subject, kind, ExpireOutcome::Expired.label(), true);
        Ok(ExpireOutcome::Expired)
    }

    /// Every kind currently restricting `subject`.
    pub async fn active_for(&self, subject: SubjectId) -> EngineResult<Vec<ActiveRestriction>> {
        Ok(self
            .store
            .list_for_subject(subject)
            .await?
            .into_iter()
            .map(|stored| ActiveRestriction {
                kind: stored.kind,
                expires_at: stored.expires_at,
            })
            .collect())
    }

    /// Re-grant every persisted restriction of `subject`.
    ///
    /// Used when the platform forgot the subject's capabilities, e.g. after it
    /// left and rejoined. Timed restrictions already due are left to the
    /// sweeper. Per-kind adapter failures are collected; store failures abort.
    pub async fn reapply(&self, subject: SubjectId) -> EngineResult<ReapplyReport> {
        let mut report = ReapplyReport::default();

        for stored in self.store.list_for_subject(subject).await? {
            let kind = stored.kind;
            let _guard = self.locks.acquire(subject, kind).await;
            let now = self.clock.now();

            // Re-check under the lock; a lift may have raced the listing.
            let state = self.classify(subject, kind).await?;
            if !state.is_active() {
                continue;
            }
            if let Some(expires_at) = state.expires_at()
                && expires_at <= now
            {
                debug!(subject = %subject, kind = %kind, expires_at, "Skipping due restriction");
                continue;
            }
            self.store.insert_permanent(subject, kind, now).await?;

            match self.grant(subject, kind).await {
                Ok(()) => report.granted.push(kind),
                Err(e) => {
                    warn!(subject = %subject, kind = %kind, error = %e, "Reapply grant failed");
                    metrics::record_adapter_failure("reapply", kind, e.error_code());
                    report.failed.push((kind, e));
                }
            }
        }

        info!(
            subject = %subject,
            granted = report.granted.len(),
            failed = report.failed.len(),
            "Restrictions reapplied"
        );
        Ok(report)
    }

    /// Classify a key. A timed entry wins even if its marker is missing, so
    /// callers can repair the marker.
    async fn classify(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> EngineResult<RestrictionState> {
        if let Some(expires_at) = self.store.get_timed(subject, kind).await? {
            return Ok(RestrictionState::Timed { expires_at });
        }
        if self.store.has_permanent(subject, kind).await? {
            return Ok(RestrictionState::Permanent);
        }
        Ok(RestrictionState::Absent)
    }

    async fn grant(&self, subject: SubjectId, kind: RestrictionKind) -> Result<(), AdapterError> {
        tokio::time::timeout(self.adapter_timeout, self.adapter.grant(subject, kind))
            .await
            .map_err(|_| AdapterError::Timeout(self.adapter_timeout))?
    }

    async fn revoke(&self, subject: SubjectId, kind: RestrictionKind) -> Result<(), AdapterError> {
        tokio::time::timeout(self.adapter_timeout, self.adapter.revoke(subject, kind))
            .await
            .map_err(|_| AdapterError::Timeout(self.adapter_timeout))?
    }

    /// Remove the marker written ahead of a failed grant. `false` if the
    /// marker may still be in the store.
    async fn rollback_marker(&self, subject: SubjectId, kind: RestrictionKind) -> bool {
        match self.store.delete_permanent(subject, kind).await {
            Ok(_) => true,
            Err(e) => {
                error!(
                    subject = %subject,
                    kind = %kind,
                    error = %e,
                    "Failed to roll back marker after grant failure"
                );
                false
            }
        }
    }

    /// Revoke a grant whose records could not be written.
    async fn undo_grant(&self, subject: SubjectId, kind: RestrictionKind) {
        if let Err(e) = self.revoke(subject, kind).await {
            error!(
                subject = %subject,
                kind = %kind,
                error = %e,
                "Failed to revoke grant after store failure"
            );
            metrics::record_adapter_failure("impose_timed", kind, e.error_code());
        }
    }

    fn adapter_failed(
        &self,
        op: &'static str,
        subject: SubjectId,
        kind: RestrictionKind,
        source: AdapterError,
        store_committed: bool,
    ) -> EngineError {
        warn!(
            op,
            subject = %subject,
            kind = %kind,
            error = %source,
            store_committed,
            "Capability adapter call failed"
        );
        metrics::record_adapter_failure(op, kind, source.error_code());
        EngineError::adapter(source, store_committed)
    }

    fn record(
        &self,
        op: &'static str,
        subject: SubjectId,
        kind: RestrictionKind,
        outcome: &'static str,
        changed: bool,
    ) {
        if changed {
            info!(op, subject = %subject, kind = %kind, outcome, "Restriction changed");
        } else {
            debug!(op, subject = %subject, kind = %kind, outcome, "No change");
        }
        metrics::record_operation(op, kind, outcome);
    }
}
