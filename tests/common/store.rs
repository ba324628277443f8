//! Store wrapper counting mutating calls, with switches to fail writes.

use async_trait::async_trait;
use restrictd::db::DbError;
use restrictd::restriction::{RestrictionKind, SubjectId, Timestamp};
use restrictd::store::{Cleared, DueRestriction, RestrictionStore, StoredRestriction};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct CountingStore {
    inner: Arc<dyn RestrictionStore>,
    mutations: AtomicUsize,
    fail_schedules: AtomicBool,
    fail_marker_deletes: AtomicBool,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(inner: Arc<dyn RestrictionStore>) -> Self {
        Self {
            inner,
            mutations: AtomicUsize::new(0),
            fail_schedules: AtomicBool::new(false),
            fail_marker_deletes: AtomicBool::new(false),
        }
    }

    /// Make `schedule_timed` fail without writing anything.
    pub fn fail_schedules(&self, fail: bool) {
        self.fail_schedules.store(fail, Ordering::SeqCst);
    }

    /// Make `delete_permanent` fail without writing anything.
    pub fn fail_marker_deletes(&self, fail: bool) {
        self.fail_marker_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RestrictionStore for CountingStore {
    async fn has_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        self.inner.has_permanent(subject, kind).await
    }

    async fn insert_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        created_at: Timestamp,
    ) -> Result<bool, DbError> {
        self.bump();
        self.inner.insert_permanent(subject, kind, created_at).await
    }

    async fn delete_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        self.bump();
        if self.fail_marker_deletes.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        self.inner.delete_permanent(subject, kind).await
    }

    async fn get_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<Option<Timestamp>, DbError> {
        self.inner.get_timed(subject, kind).await
    }

    async fn upsert_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError> {
        self.bump();
        self.inner.upsert_timed(subject, kind, expires_at).await
    }

    async fn schedule_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
        created_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError> {
        self.bump();
        if self.fail_schedules.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        self.inner
            .schedule_timed(subject, kind, expires_at, created_at)
            .await
    }

    async fn delete_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        self.bump();
        self.inner.delete_timed(subject, kind).await
    }

    async fn list_due_timed(&self, now: Timestamp) -> Result<Vec<DueRestriction>, DbError> {
        self.inner.list_due_timed(now).await
    }

    async fn clear(&self, subject: SubjectId, kind: RestrictionKind) -> Result<Cleared, DbError> {
        self.bump();
        self.inner.clear(subject, kind).await
    }

    async fn list_for_subject(
        &self,
        subject: SubjectId,
    ) -> Result<Vec<StoredRestriction>, DbError> {
        self.inner.list_for_subject(subject).await
    }
}
