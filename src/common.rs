//! Shared building blocks: errors, configuration and small utilities.

pub mod config;
pub mod errors;
pub mod utils;

pub use self::config::{ConfigFile, KeyConfig};
pub use self::errors::{BackendError, Error, Result};
pub use self::utils::{ZeroizingVec, constant_time_eq};
