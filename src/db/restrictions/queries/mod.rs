//! Database query methods for restriction records.

pub mod permanent;
pub mod timed;

use crate::db::DbError;
use crate::restriction::{RestrictionKind, SubjectId, Timestamp};
use crate::store::{Cleared, DueRestriction, StoredRestriction};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Generates repository wrapper methods that forward to module-level functions.
macro_rules! restriction_repository_methods {
    (
        $(
            $(#[$meta:meta])*
            fn $method_name:ident($($arg:ident: $arg_ty:ty),*) -> $ret_ty:ty
                => $module:ident::$fn_name:ident;
        )*
    ) => {
        $(
            $(#[$meta])*
            pub async fn $method_name(&self, $($arg: $arg_ty),*) -> $ret_ty {
                $module::$fn_name(self.pool, $($arg),*).await
            }
        )*
    };
}

/// Repository for restriction operations.
pub struct RestrictionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RestrictionRepository<'a> {
    /// Create a new restriction repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    restriction_repository_methods! {
        // ========== Permanent markers ==========

        /// Whether a marker exists.
        fn has_permanent(subject: SubjectId, kind: RestrictionKind) -> Result<bool, DbError>
            => permanent::has_permanent;

        /// Insert a marker. `false` if it already existed.
        fn insert_permanent(subject: SubjectId, kind: RestrictionKind, created_at: Timestamp) -> Result<bool, DbError>
            => permanent::insert_permanent;

        /// Delete a marker. `false` if none existed.
        fn delete_permanent(subject: SubjectId, kind: RestrictionKind) -> Result<bool, DbError>
            => permanent::delete_permanent;

        /// All kinds with a marker for one subject.
        fn permanent_kinds(subject: SubjectId) -> Result<Vec<RestrictionKind>, DbError>
            => permanent::permanent_kinds;

        // ========== Timed entries ==========

        /// Current expiry, if any.
        fn get_timed(subject: SubjectId, kind: RestrictionKind) -> Result<Option<Timestamp>, DbError>
            => timed::get_timed;

        /// Insert or overwrite an expiry, returning the previous one.
        fn upsert_timed(subject: SubjectId, kind: RestrictionKind, expires_at: Timestamp) -> Result<Option<Timestamp>, DbError>
            => timed::upsert_timed;

        /// Delete an expiry. `false` if none existed.
        fn delete_timed(subject: SubjectId, kind: RestrictionKind) -> Result<bool, DbError>
            => timed::delete_timed;

        /// Every timed entry with `expires_at <= now`, oldest first.
        fn list_due_timed(now: Timestamp) -> Result<Vec<DueRestriction>, DbError>
            => timed::list_due_timed;

        /// All timed entries for one subject.
        fn timed_for_subject(subject: SubjectId) -> Result<Vec<(RestrictionKind, Timestamp)>, DbError>
            => timed::timed_for_subject;
    }

    // ========== Combined operations ==========

    /// Ensure the marker and write the expiry in one transaction.
    ///
    /// Returns the previous expiry. Either both rows are in place afterwards
    /// or neither statement took effect.
    pub async fn schedule_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
        created_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        permanent::insert_permanent_in(&mut *tx, subject, kind, created_at).await?;
        let previous = timed::upsert_timed_in(&mut *tx, subject, kind, expires_at).await?;

        tx.commit().await?;

        Ok(previous)
    }

    /// Remove both records for a key in one transaction.
    pub async fn clear(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<Cleared, DbError> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let timed: Option<i64> = sqlx::query_scalar(
            "SELECT expires_at FROM timed_restrictions WHERE subject = ? AND kind = ?",
        )
        .bind(subject.to_db())
        .bind(kind.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM timed_restrictions WHERE subject = ? AND kind = ?")
            .bind(subject.to_db())
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;

        let permanent = sqlx::query(
            "DELETE FROM permanent_restrictions WHERE subject = ? AND kind = ?",
        )
        .bind(subject.to_db())
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        tx.commit().await?;

        Ok(Cleared { permanent, timed })
    }

    /// Merge markers and timed entries for one subject, ordered by kind.
    pub async fn list_for_subject(
        &self,
        subject: SubjectId,
    ) -> Result<Vec<StoredRestriction>, DbError> {
        let mut merged: BTreeMap<RestrictionKind, StoredRestriction> = BTreeMap::new();

        for kind in self.permanent_kinds(subject).await? {
            merged.insert(
                kind,
                StoredRestriction {
                    kind,
                    has_marker: true,
                    expires_at: None,
                },
            );
        }

        for (kind, expires_at) in self.timed_for_subject(subject).await? {
            merged
                .entry(kind)
                .or_insert(StoredRestriction {
                    kind,
                    has_marker: false,
                    expires_at: None,
                })
                .expires_at = Some(expires_at);
        }

        Ok(merged.into_values().collect())
    }
}
