//! Restricted subject identity.

use std::fmt;

/// Stable numeric platform id of a restricted member.
///
/// Stored in SQLite as `INTEGER` by bit-reinterpretation, so the full `u64`
/// range round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(pub u64);

impl SubjectId {
    pub fn to_db(self) -> i64 {
        self.0 as i64
    }

    pub fn from_db(raw: i64) -> Self {
        Self(raw as u64)
    }
}

impl From<u64> for SubjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
