//! Error types for the tabpilot protocol layer.

mod provider;
mod session;
mod tool;

pub use provider::*;
pub use session::*;
pub use tool::*;
