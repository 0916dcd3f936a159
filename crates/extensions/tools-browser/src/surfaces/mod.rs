//! Surface (tab) registry.
//!
//! Tracks the CDP page targets of one Chrome instance as addressable
//! surfaces with stable `tab-N` ids. Launches Chrome with a persistent
//! profile when nothing listens on the debug port.

mod launch;
mod registry;
mod types;

pub use launch::find_chrome;
pub use registry::SurfaceRegistry;
pub use types::{BrowserError, SurfaceConfig, SurfaceStatus};

#[cfg(test)]
#[path = "surfaces_tests.rs"]
mod tests;
