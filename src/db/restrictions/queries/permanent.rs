//! Permanent marker operations.

use super::super::models::decode_kind;
use crate::db::DbError;
use crate::restriction::{RestrictionKind, SubjectId, Timestamp};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::warn;

const INSERT_MARKER: &str = r#"
    INSERT OR IGNORE INTO permanent_restrictions (subject, kind, created_at)
    VALUES (?, ?, ?)
"#;

/// Check whether a marker exists.
pub async fn has_permanent(
    pool: &SqlitePool,
    subject: SubjectId,
    kind: RestrictionKind,
) -> Result<bool, DbError> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM permanent_restrictions WHERE subject = ? AND kind = ?",
    )
    .bind(subject.to_db())
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

/// Insert a marker, leaving an existing one (and its `created_at`) untouched.
pub async fn insert_permanent(
    pool: &SqlitePool,
    subject: SubjectId,
    kind: RestrictionKind,
    created_at: Timestamp,
) -> Result<bool, DbError> {
    let result = sqlx::query(INSERT_MARKER)
        .bind(subject.to_db())
        .bind(kind.as_str())
        .bind(created_at)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// [`insert_permanent`] on a connection that already holds a transaction.
pub(super) async fn insert_permanent_in(
    conn: &mut SqliteConnection,
    subject: SubjectId,
    kind: RestrictionKind,
    created_at: Timestamp,
) -> Result<bool, DbError> {
    let result = sqlx::query(INSERT_MARKER)
        .bind(subject.to_db())
        .bind(kind.as_str())
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a marker.
pub async fn delete_permanent(
    pool: &SqlitePool,
    subject: SubjectId,
    kind: RestrictionKind,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM permanent_restrictions WHERE subject = ? AND kind = ?")
        .bind(subject.to_db())
        .bind(kind.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List kinds with a marker for a subject.
///
/// Rows with an unrecognised kind are logged and skipped.
pub async fn permanent_kinds(
    pool: &SqlitePool,
    subject: SubjectId,
) -> Result<Vec<RestrictionKind>, DbError> {
    let rows: Vec<String> =
        sqlx::query_scalar("SELECT kind FROM permanent_restrictions WHERE subject = ?")
            .bind(subject.to_db())
            .fetch_all(pool)
            .await?;

    Ok(rows
        .iter()
        .filter_map(|raw| match decode_kind(raw) {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!(subject = %subject, error = %e, "Skipping unreadable permanent restriction");
                None
            }
        })
        .collect())
}
