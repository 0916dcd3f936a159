//! Page channel over CDP `Runtime.evaluate`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace};

use tabpilot_protocols::SurfaceId;

use super::envelope::{ChannelError, PageRequest, PageResponse, UNAVAILABLE_MARKER};
use super::PageChannel;
use crate::cdp::CdpError;
use crate::surfaces::{BrowserError, SurfaceRegistry};

/// The page agent bundle. Installs `window.__tabpilot`.
pub const PAGE_AGENT_JS: &str = include_str!("page_agent.js");

/// Must match `VERSION` in `page_agent.js`.
pub const AGENT_VERSION: &str = "1.0.0";

/// Page channel backed by the surface registry's CDP sessions.
pub struct CdpPageChannel {
    registry: Arc<SurfaceRegistry>,
}

impl CdpPageChannel {
    pub fn new(registry: Arc<SurfaceRegistry>) -> Self {
        Self { registry }
    }

    async fn agent_version(&self, surface: &SurfaceId) -> Result<Option<String>, ChannelError> {
        let session = self.registry.session(surface).await.map_err(unavailable)?;
        let value = session
            .evaluate_with_timeout(
                "(window.__tabpilot && window.__tabpilot.version) || null",
                Duration::from_secs(5),
            )
            .await
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;
        Ok(value.as_str().map(|s| s.to_string()))
    }
}

fn unavailable(e: BrowserError) -> ChannelError {
    ChannelError::Unavailable(e.to_string())
}

/// Expression that forwards one envelope to the agent.
fn request_expression(request: &PageRequest) -> Result<String, ChannelError> {
    let payload =
        serde_json::to_string(request).map_err(|e| ChannelError::Protocol(e.to_string()))?;
    Ok(format!(
        "(window.__tabpilot ? window.__tabpilot.handle({payload}) : {{ok: false, error: {marker:?}}})",
        marker = UNAVAILABLE_MARKER
    ))
}

#[async_trait]
impl PageChannel for CdpPageChannel {
    async fn ensure_ready(&self, surface: &SurfaceId) -> Result<(), ChannelError> {
        if self.agent_version(surface).await?.as_deref() == Some(AGENT_VERSION) {
            return Ok(());
        }

        debug!("Injecting page agent into {}", surface);
        let session = self.registry.session(surface).await.map_err(unavailable)?;
        session
            .evaluate_with_timeout(PAGE_AGENT_JS, Duration::from_secs(10))
            .await
            .map_err(|e| ChannelError::Unavailable(format!("agent injection failed: {e}")))?;

        match self.agent_version(surface).await? {
            Some(v) if v == AGENT_VERSION => Ok(()),
            other => Err(ChannelError::Unavailable(format!(
                "agent did not initialise (version {:?})",
                other
            ))),
        }
    }

    async fn request(
        &self,
        surface: &SurfaceId,
        request: PageRequest,
        timeout: Duration,
    ) -> Result<Value, ChannelError> {
        let session = self.registry.session(surface).await.map_err(unavailable)?;
        let expression = request_expression(&request)?;
        trace!("page request {} -> {}", request.op, surface);

        let evaluation = tokio::time::timeout(
            timeout,
            session.evaluate_with_timeout(&expression, timeout + Duration::from_secs(1)),
        )
        .await;

        let value = match evaluation {
            Err(_) | Ok(Err(CdpError::Timeout(_))) => {
                return Err(ChannelError::Timeout {
                    op: request.op,
                    ms: timeout.as_millis() as u64,
                });
            }
            Ok(Err(CdpError::JavaScript(msg))) => return Err(ChannelError::Script(msg)),
            Ok(Err(e)) => return Err(ChannelError::Unavailable(e.to_string())),
            Ok(Ok(value)) => value,
        };

        PageResponse::into_result(value)
    }
}
