//! Expiry sweeper.
//!
//! Periodically lists due timed entries and hands each to
//! [`Engine::expire`]. A key that was lifted or extended in the meantime
//! comes back as `AlreadyResolved` and is simply counted. Failures are logged
//! and retried on the next pass; the loop never stops on its own.

use crate::restriction::{Engine, ExpireOutcome, Timestamp};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Counts from one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub already_resolved: usize,
    pub failed: usize,
}

pub struct Sweeper {
    engine: Arc<Engine>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(engine: Arc<Engine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Expire everything due at `now`.
    pub async fn sweep_once(&self, now: Timestamp) -> SweepReport {
        let started = Instant::now();
        let mut report = SweepReport::default();

        let due = match self.engine.store().list_due_timed(now).await {
            Ok(due) => due,
            Err(e) => {
                warn!(error = %e, "Failed to list due restrictions");
                return report;
            }
        };

        for entry in due {
            match self.engine.expire(entry.subject, entry.kind).await {
                Ok(ExpireOutcome::Expired) => {
                    info!(
                        subject = %entry.subject,
                        kind = %entry.kind,
                        expires_at = entry.expires_at,
                        "Timed restriction expired"
                    );
                    report.expired += 1;
                }
                Ok(ExpireOutcome::AlreadyResolved) => report.already_resolved += 1,
                Err(e) => {
                    warn!(
                        subject = %entry.subject,
                        kind = %entry.kind,
                        error = %e,
                        store_committed = e.is_store_committed(),
                        "Failed to expire restriction"
                    );
                    report.failed += 1;
                }
            }
        }

        crate::metrics::record_sweep(report.expired, started.elapsed().as_secs_f64());
        if report != SweepReport::default() {
            debug!(?report, "Sweep pass finished");
        }
        report
    }

    /// Run forever on the configured interval.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let now = self.engine.now();
                self.sweep_once(now).await;
            }
        })
    }
}
