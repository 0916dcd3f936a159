//! # tabpilot config
//!
//! Configuration schema, loading, validation and live reload for tabpilot.

mod error;
mod handle;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use handle::{ConfigHandle, ConfigWatcher};
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
