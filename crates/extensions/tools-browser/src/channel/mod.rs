//! Request/response channel into a live page.
//!
//! A page is treated as a remote service behind [`PageChannel`]: the
//! orchestration core sends `{op, args}` envelopes and gets back a typed
//! [`PageResponse`] or an error. The CDP implementation injects the page
//! agent script before forwarding.

mod cdp;
mod envelope;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use tabpilot_protocols::SurfaceId;

pub use cdp::{AGENT_VERSION, CdpPageChannel, PAGE_AGENT_JS};
pub use envelope::{ChannelError, PageRequest, PageResponse};

/// Default bound on one page request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport to the page agent of a surface.
#[async_trait]
pub trait PageChannel: Send + Sync {
    /// Make sure the surface has a live agent, injecting it when absent.
    async fn ensure_ready(&self, surface: &SurfaceId) -> Result<(), ChannelError>;

    /// Send one request and wait up to `timeout` for its result payload.
    async fn request(
        &self,
        surface: &SurfaceId,
        request: PageRequest,
        timeout: Duration,
    ) -> Result<Value, ChannelError>;
}
