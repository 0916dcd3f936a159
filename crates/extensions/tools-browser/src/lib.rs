//! Browser tools for Tabpilot.
//!
//! Drives a local Chrome over the Chrome DevTools Protocol (CDP). Each open
//! tab is a *surface*. Page-local work goes through an injected page agent
//! script reached over a typed request/response [`channel`]; the heuristics
//! (extraction ladder, result parsing, redirect unwrapping, domain scoring)
//! live on the Rust side.
//!
//! ```text
//! ┌─────────────────────┐   ToolExecutor   ┌──────────────────┐
//! │  session driver     │ ───────────────► │ BrowserDispatcher│
//! └─────────────────────┘                  └────────┬─────────┘
//!                             BrowserShell │        │ PageChannel
//!                                          ▼        ▼
//!                               ┌──────────────────────────────┐
//!                               │   Chrome (CDP WebSocket)     │
//!                               └──────────────────────────────┘
//! ```
//!
//! ## Setup
//!
//! Start Chrome with remote debugging enabled, or let the registry launch
//! one with a persistent profile:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```
//!
//! The browser is connected lazily, on the first tool call that needs it.

pub mod actions;
pub mod catalog;
pub mod cdp;
pub mod channel;
mod dispatcher;
pub mod extractor;
mod invocation;
pub mod permissions;
mod search;
mod shell;
pub mod surfaces;

#[cfg(test)]
mod testing;

pub use catalog::browser_tools;
pub use cdp::{CdpClient, CdpError, PageSession};
pub use channel::{CdpPageChannel, ChannelError, PageChannel, PageRequest, PageResponse};
pub use dispatcher::{BrowserDispatcher, DispatchSettings};
pub use extractor::{ExtractMethod, ExtractOptions, ExtractionResult, Extractor, ExtractorSettings};
pub use invocation::{ToolInvocation, ToolScope};
pub use permissions::{AutoGrant, ConfiguredPolicy, OriginAllowList, PermissionGate};
pub use search::SearchEngine;
pub use shell::BrowserShell;
pub use surfaces::{BrowserError, SurfaceConfig, SurfaceRegistry, SurfaceStatus};
