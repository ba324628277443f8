//! Per-(subject, kind) mutual exclusion.
//!
//! Operations on the same key serialize on an async mutex; different keys never
//! contend beyond a DashMap shard lock. Idle entries are removed when the last
//! guard or waiter for a key goes away, so the map only holds in-flight keys.

use super::{RestrictionKind, SubjectId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Key = (SubjectId, RestrictionKind);

/// Registry of key-scoped locks.
#[derive(Debug, Default, Clone)]
pub struct KeyLocks {
    locks: Arc<DashMap<Key, Arc<Mutex<()>>>>,
}

/// Held lock for one key. Releases (and prunes the entry if idle) on drop.
#[derive(Debug)]
pub struct KeyGuard {
    key: Key,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<Key, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `(subject, kind)`.
    pub async fn acquire(&self, subject: SubjectId, kind: RestrictionKind) -> KeyGuard {
        let key = (subject, kind);
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        KeyGuard {
            key,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left means nobody holds or waits on it.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
