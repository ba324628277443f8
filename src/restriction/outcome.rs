//! Derived per-key state and operation outcomes.

use super::{RestrictionKind, Timestamp};

/// State of one (subject, kind) key, always derived fresh from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionState {
    Absent,
    /// Marker present, no timed entry.
    Permanent,
    /// Marker present with a scheduled expiry.
    Timed { expires_at: Timestamp },
}

impl RestrictionState {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        match self {
            Self::Timed { expires_at } => Some(*expires_at),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImposeOutcome {
    NewlyImposed,
    /// A timed restriction became permanent; the old expiry was discarded.
    UpgradedFromTimed { previous_expiry: Timestamp },
    AlreadyImposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImposeTimedOutcome {
    NewlyImposed,
    Updated { previous_expiry: Timestamp },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiftOutcome {
    Lifted,
    NotRestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireOutcome {
    Expired,
    /// The entry was lifted or pushed back before the sweeper got to it.
    AlreadyResolved,
}

impl ImposeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewlyImposed => "newly_imposed",
            Self::UpgradedFromTimed { .. } => "upgraded_from_timed",
            Self::AlreadyImposed => "already_imposed",
        }
    }
}

impl ImposeTimedOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewlyImposed => "newly_imposed",
            Self::Updated { .. } => "updated",
        }
    }
}

impl LiftOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lifted => "lifted",
            Self::NotRestricted => "not_restricted",
        }
    }
}

impl ExpireOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::AlreadyResolved => "already_resolved",
        }
    }
}

/// One kind currently restricting a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRestriction {
    pub kind: RestrictionKind,
    /// `None` for permanent restrictions.
    pub expires_at: Option<Timestamp>,
}

/// Result of re-granting a subject's persisted restrictions.
#[derive(Debug, Default)]
pub struct ReapplyReport {
    pub granted: Vec<RestrictionKind>,
    pub failed: Vec<(RestrictionKind, crate::adapter::AdapterError)>,
}
