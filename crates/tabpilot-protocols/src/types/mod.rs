//! Common types used across tabpilot.

mod common;
mod message;

pub use common::*;
pub use message::*;
