//! Repository for permanent markers and timed entries.

mod models;
mod queries;

pub use queries::RestrictionRepository;

use super::{Database, DbError};
use crate::restriction::{RestrictionKind, SubjectId, Timestamp};
use crate::store::{Cleared, DueRestriction, RestrictionStore, StoredRestriction};
use async_trait::async_trait;

#[async_trait]
impl RestrictionStore for Database {
    async fn has_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        self.restrictions().has_permanent(subject, kind).await
    }

    async fn insert_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        created_at: Timestamp,
    ) -> Result<bool, DbError> {
        self.restrictions()
            .insert_permanent(subject, kind, created_at)
            .await
    }

    async fn delete_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        self.restrictions().delete_permanent(subject, kind).await
    }

    async fn get_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<Option<Timestamp>, DbError> {
        self.restrictions().get_timed(subject, kind).await
    }

    async fn upsert_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError> {
        self.restrictions().upsert_timed(subject, kind, expires_at).await
    }

    async fn schedule_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
        created_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError> {
        self.restrictions()
            .schedule_timed(subject, kind, expires_at, created_at)
            .await
    }

    async fn delete_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        self.restrictions().delete_timed(subject, kind).await
    }

    async fn list_due_timed(&self, now: Timestamp) -> Result<Vec<DueRestriction>, DbError> {
        self.restrictions().list_due_timed(now).await
    }

    async fn clear(&self, subject: SubjectId, kind: RestrictionKind) -> Result<Cleared, DbError> {
        self.restrictions().clear(subject, kind).await
    }

    async fn list_for_subject(
        &self,
        subject: SubjectId,
    ) -> Result<Vec<StoredRestriction>, DbError> {
        self.restrictions().list_for_subject(subject).await
    }
}
