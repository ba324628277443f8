//! Timed entry operations.

use super::super::models::{TimedRow, decode_kind};
use crate::db::DbError;
use crate::restriction::{RestrictionKind, SubjectId, Timestamp};
use crate::store::DueRestriction;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::warn;

/// Get the expiry for a key.
pub async fn get_timed(
    pool: &SqlitePool,
    subject: SubjectId,
    kind: RestrictionKind,
) -> Result<Option<Timestamp>, DbError> {
    let expires_at: Option<i64> = sqlx::query_scalar(
        "SELECT expires_at FROM timed_restrictions WHERE subject = ? AND kind = ?",
    )
    .bind(subject.to_db())
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(expires_at)
}

/// Insert or overwrite the expiry for a key.
///
/// Returns the previous expiry when the row already existed.
pub async fn upsert_timed(
    pool: &SqlitePool,
    subject: SubjectId,
    kind: RestrictionKind,
    expires_at: Timestamp,
) -> Result<Option<Timestamp>, DbError> {
    // IMMEDIATE takes the write lock up front; a deferred read-then-write
    // fails with SQLITE_BUSY_SNAPSHOT when another connection commits first.
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    let previous = upsert_timed_in(&mut *tx, subject, kind, expires_at).await?;
    tx.commit().await?;

    Ok(previous)
}

/// [`upsert_timed`] on a connection that already holds a write transaction.
pub(super) async fn upsert_timed_in(
    conn: &mut SqliteConnection,
    subject: SubjectId,
    kind: RestrictionKind,
    expires_at: Timestamp,
) -> Result<Option<Timestamp>, DbError> {
    let previous: Option<i64> = sqlx::query_scalar(
        "SELECT expires_at FROM timed_restrictions WHERE subject = ? AND kind = ?",
    )
    .bind(subject.to_db())
    .bind(kind.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO timed_restrictions (subject, kind, expires_at)
        VALUES (?, ?, ?)
        ON CONFLICT (subject, kind) DO UPDATE SET expires_at = excluded.expires_at
        "#,
    )
    .bind(subject.to_db())
    .bind(kind.as_str())
    .bind(expires_at)
    .execute(&mut *conn)
    .await?;

    Ok(previous)
}

/// Remove the expiry for a key.
pub async fn delete_timed(
    pool: &SqlitePool,
    subject: SubjectId,
    kind: RestrictionKind,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM timed_restrictions WHERE subject = ? AND kind = ?")
        .bind(subject.to_db())
        .bind(kind.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List all entries due at `now`.
///
/// Rows with an unrecognised kind are logged and skipped so one bad row
/// cannot stall expiry for everything else.
pub async fn list_due_timed(
    pool: &SqlitePool,
    now: Timestamp,
) -> Result<Vec<DueRestriction>, DbError> {
    let rows = sqlx::query_as::<_, TimedRow>(
        r#"
        SELECT subject, kind, expires_at
        FROM timed_restrictions
        WHERE expires_at <= ?
        ORDER BY expires_at, subject
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match DueRestriction::try_from(row) {
            Ok(due) => Some(due),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable timed restriction");
                None
            }
        })
        .collect())
}

/// List timed entries for one subject, skipping unreadable kinds.
pub async fn timed_for_subject(
    pool: &SqlitePool,
    subject: SubjectId,
) -> Result<Vec<(RestrictionKind, Timestamp)>, DbError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT kind, expires_at FROM timed_restrictions WHERE subject = ?",
    )
    .bind(subject.to_db())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(raw, expires_at)| match decode_kind(&raw) {
            Ok(kind) => Some((kind, expires_at)),
            Err(e) => {
                warn!(subject = %subject, error = %e, "Skipping unreadable timed restriction");
                None
            }
        })
        .collect())
}
