//! In-process store backed by a DashMap.
//!
//! Both records for a key live in one map entry, so every per-key operation
//! (including [`RestrictionStore::clear`]) is atomic under the shard lock.

use super::{Cleared, DueRestriction, RestrictionStore, StoredRestriction};
use crate::db::DbError;
use crate::restriction::{RestrictionKind, SubjectId, Timestamp};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

type Key = (SubjectId, RestrictionKind);

#[derive(Debug, Clone, Copy, Default)]
struct Records {
    /// `created_at` of the permanent marker.
    marker: Option<Timestamp>,
    expires_at: Option<Timestamp>,
}

impl Records {
    fn is_empty(&self) -> bool {
        self.marker.is_none() && self.expires_at.is_none()
    }

    fn ensure_marker(&mut self, created_at: Timestamp) -> bool {
        if self.marker.is_some() {
            return false;
        }
        self.marker = Some(created_at);
        true
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<Key, Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to the key's records, dropping the entry if it ends up empty.
    fn update<T>(&self, key: Key, f: impl FnOnce(&mut Records) -> T) -> T {
        match self.records.entry(key) {
            Entry::Occupied(mut occupied) => {
                let out = f(occupied.get_mut());
                if occupied.get().is_empty() {
                    occupied.remove();
                }
                out
            }
            Entry::Vacant(vacant) => {
                let mut records = Records::default();
                let out = f(&mut records);
                if !records.is_empty() {
                    vacant.insert(records);
                }
                out
            }
        }
    }

    fn read(&self, key: Key) -> Records {
        self.records.get(&key).map(|r| *r).unwrap_or_default()
    }
}

#[async_trait]
impl RestrictionStore for MemoryStore {
    async fn has_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        Ok(self.read((subject, kind)).marker.is_some())
    }

    async fn insert_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        created_at: Timestamp,
    ) -> Result<bool, DbError> {
        Ok(self.update((subject, kind), |r| r.ensure_marker(created_at)))
    }

    async fn delete_permanent(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        Ok(self.update((subject, kind), |r| r.marker.take().is_some()))
    }

    async fn get_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<Option<Timestamp>, DbError> {
        Ok(self.read((subject, kind)).expires_at)
    }

    async fn upsert_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError> {
        Ok(self.update((subject, kind), |r| r.expires_at.replace(expires_at)))
    }

    async fn schedule_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
        expires_at: Timestamp,
        created_at: Timestamp,
    ) -> Result<Option<Timestamp>, DbError> {
        Ok(self.update((subject, kind), |r| {
            r.ensure_marker(created_at);
            r.expires_at.replace(expires_at)
        }))
    }

    async fn delete_timed(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<bool, DbError> {
        Ok(self.update((subject, kind), |r| r.expires_at.take().is_some()))
    }

    async fn list_due_timed(&self, now: Timestamp) -> Result<Vec<DueRestriction>, DbError> {
        let mut due: Vec<DueRestriction> = self
            .records
            .iter()
            .filter_map(|entry| {
                let (subject, kind) = *entry.key();
                entry
                    .value()
                    .expires_at
                    .filter(|exp| *exp <= now)
                    .map(|expires_at| DueRestriction {
                        subject,
                        kind,
                        expires_at,
                    })
            })
            .collect();
        due.sort_by_key(|d| (d.expires_at, d.subject, d.kind));
        Ok(due)
    }

    async fn clear(&self, subject: SubjectId, kind: RestrictionKind) -> Result<Cleared, DbError> {
        Ok(self
            .records
            .remove(&(subject, kind))
            .map(|(_, r)| Cleared {
                permanent: r.marker.is_some(),
                timed: r.expires_at,
            })
            .unwrap_or_default())
    }

    async fn list_for_subject(
        &self,
        subject: SubjectId,
    ) -> Result<Vec<StoredRestriction>, DbError> {
        let mut listed: Vec<StoredRestriction> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == subject)
            .map(|entry| StoredRestriction {
                kind: entry.key().1,
                has_marker: entry.value().marker.is_some(),
                expires_at: entry.value().expires_at,
            })
            .collect();
        listed.sort_by_key(|r| r.kind);
        Ok(listed)
    }
}
