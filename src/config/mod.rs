//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading
//! - [`defaults`]: serde default values
//! - [`validation`]: startup validation collecting every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{
    AdapterConfig, AdapterKind, Config, ConfigError, DatabaseConfig, MetricsConfig, SweeperConfig,
};
pub use validation::{ValidationError, validate};
