//! restrictd - moderation restriction reconciliation engine.
//!
//! Keeps each (subject, restriction kind) pair consistent across durable
//! storage and the platform's live capability state. See [`restriction::Engine`]
//! for the four operations and [`sweeper::Sweeper`] for time-driven expiry.

pub mod adapter;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod metrics;
pub mod restriction;
pub mod store;
pub mod sweeper;

pub use error::{EngineError, EngineResult};
pub use restriction::{Engine, RestrictionKind, SubjectId};
