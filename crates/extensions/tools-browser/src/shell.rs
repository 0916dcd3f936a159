//! Browser-shell seam: operations on the browser chrome rather than on a
//! page's document.

use async_trait::async_trait;

use tabpilot_protocols::SurfaceId;

use crate::surfaces::{BrowserError, SurfaceStatus};

/// Tab-level browser operations used by the shell tools and by navigation
/// reconciliation.
#[async_trait]
pub trait BrowserShell: Send + Sync {
    /// Open a tab, optionally at `url`, and return its surface id.
    async fn open_tab(&self, url: Option<&str>) -> Result<SurfaceId, BrowserError>;

    async fn close_tab(&self, surface: &SurfaceId) -> Result<(), BrowserError>;

    /// Bring a tab to the foreground.
    async fn activate(&self, surface: &SurfaceId) -> Result<(), BrowserError>;

    /// All open tabs, oldest first.
    async fn list_tabs(&self) -> Result<Vec<SurfaceStatus>, BrowserError>;

    /// Current URL, title and ready state of one tab.
    async fn status(&self, surface: &SurfaceId) -> Result<SurfaceStatus, BrowserError>;

    /// Navigate at browser level and wait for the document to load.
    async fn navigate(&self, surface: &SurfaceId, url: &str) -> Result<(), BrowserError>;

    /// Oldest open tab, if any.
    async fn first_surface(&self) -> Option<SurfaceId>;
}
