//! Capability adapter double that records calls and can be told to fail.

use async_trait::async_trait;
use restrictd::adapter::{AdapterError, CapabilityAdapter};
use restrictd::restriction::{RestrictionKind, SubjectId};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Grant(SubjectId, RestrictionKind),
    Revoke(SubjectId, RestrictionKind),
}

#[derive(Default)]
pub struct RecordingAdapter {
    grants: AtomicUsize,
    revokes: AtomicUsize,
    fail_grants: AtomicBool,
    fail_revokes: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl RecordingAdapter {
    pub fn grants(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }

    pub fn revokes(&self) -> usize {
        self.revokes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.grants() + self.revokes()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_grants(&self, fail: bool) {
        self.fail_grants.store(fail, Ordering::SeqCst);
    }

    pub fn fail_revokes(&self, fail: bool) {
        self.fail_revokes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CapabilityAdapter for RecordingAdapter {
    async fn grant(&self, subject: SubjectId, kind: RestrictionKind) -> Result<(), AdapterError> {
        self.grants.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call::Grant(subject, kind));
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(AdapterError::Forbidden);
        }
        Ok(())
    }

    async fn revoke(&self, subject: SubjectId, kind: RestrictionKind) -> Result<(), AdapterError> {
        self.revokes.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call::Revoke(subject, kind));
        if self.fail_revokes.load(Ordering::SeqCst) {
            return Err(AdapterError::Transport("connection reset".to_string()));
        }
        Ok(())
    }
}
