//! Restriction store abstraction.
//!
//! Two record kinds per (subject, kind) key: a permanent marker (set
//! membership) and a timed entry (one expiry, overwritten on upsert). The
//! store holds no business logic; the engine keeps the two consistent.

use crate::db::DbError;
use crate::restriction::{RestrictionKind, SubjectId, Timestamp};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryStore;

/// A timed entry whose expiry has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueRestriction {
    pub subject: SubjectId,
    pub kind: RestrictionKind,
    pub expires_at: Timestamp,
}

/// What a [`RestrictionStore::clear`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cleared {
    pub permanent: bool,
    pub timed: Option<Timestamp>,
}

impl Cleared {
    /// Nothing existed for the key.
    pub fn is_empty(&self) -> bool {
        !self.permanent && self.timed.is_none()
    }
}

/// Both records for one kind held by a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredRestriction {
    pub kind: RestrictionKind,
    pub has_marker: bool,
    pub expires_at: Option<Timestamp>,
}

#[async_trait]
pub trait RestrictionStore: Send + Sync {
    async fn has_permanent(&self, subject: SubjectId, kind: RestrictionKind)
    -> Result<bool, DbError>;

    /// `true` if newly created, `false` if it already existed. An existing
    /// marker keeps its original `created_at`.
    async fn insert_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        created_at: Timestamp,
    ) -> Result<bool, DbError>;

    /// `true` if a marker was removed.
    async fn delete_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError>;

    async fn get_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<Option<Timestamp>, DbError>;

    /// Insert or overwrite the expiry. Returns the previous expiry, if any.
    async fn upsert_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError>;

    /// Ensure the marker and insert or overwrite the expiry as one unit.
    /// Returns the previous expiry, if any. On error neither record changed.
    async fn schedule_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
        created_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError>;

    /// `true` if an entry was removed.
    async fn delete_timed(&self, subject: SubjectId, kind: RestrictionKind)
    -> Result<bool, DbError>;

    /// All timed entries with `expires_at <= now`, across kinds and subjects.
    async fn list_due_timed(&self, now: Timestamp) -> Result<Vec<DueRestriction>, DbError>;

    /// Remove both records for a key as one unit.
    async fn clear(&self, subject: SubjectId, kind: RestrictionKind) -> Result<Cleared, DbError>;

    /// Every kind with any record for `subject`, ordered by kind.
    async fn list_for_subject(&self, subject: SubjectId)
    -> Result<Vec<StoredRestriction>, DbError>;
}
