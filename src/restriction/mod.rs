//! Restriction domain: kinds, subjects, time, and the reconciliation engine.

mod clock;
mod engine;
mod kind;
mod length;
mod locks;
mod outcome;
mod subject;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use engine::{DEFAULT_ADAPTER_TIMEOUT, Engine};
pub use kind::{RestrictionKind, UnknownKind};
pub use length::parse_length;
pub use locks::{KeyGuard, KeyLocks};
pub use outcome::{
    ActiveRestriction, ExpireOutcome, ImposeOutcome, ImposeTimedOutcome, LiftOutcome,
    ReapplyReport, RestrictionState,
};
pub use subject::SubjectId;
