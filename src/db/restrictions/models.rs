//! Row decoding for restriction tables.

use crate::db::DbError;
use crate::restriction::{RestrictionKind, SubjectId};
use crate::store::DueRestriction;

/// Raw `timed_restrictions` row: (subject, kind, expires_at).
pub(super) type TimedRow = (i64, String, i64);

/// Decode a stored kind key.
pub(super) fn decode_kind(raw: &str) -> Result<RestrictionKind, DbError> {
    raw.parse()
        .map_err(|e: crate::restriction::UnknownKind| DbError::CorruptRow(e.to_string()))
}

impl TryFrom<TimedRow> for DueRestriction {
    type Error = DbError;

    fn try_from((subject, kind, expires_at): TimedRow) -> Result<Self, Self::Error> {
        Ok(DueRestriction {
            subject: SubjectId::from_db(subject),
            kind: decode_kind(&kind)?,
            expires_at,
        })
    }
}
