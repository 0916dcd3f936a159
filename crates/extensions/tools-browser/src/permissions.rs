//! Per-origin permission policies for page agent injection.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};
use url::Url;

use tabpilot_config::{ConfigHandle, PermissionMode, PermissionsConfig};
use tabpilot_protocols::{PermissionDecision, PermissionPolicy, ToolError};

/// `scheme://host[:port]` of an http(s) URL. Other schemes have no origin to check.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    Some(parsed.origin().ascii_serialization())
}

/// Config entries may name a bare host; treat those as https.
fn normalize_entry(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    origin_of(entry).or_else(|| origin_of(&format!("https://{}", entry)))
}

/// Grants every origin after logging a notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoGrant;

#[async_trait]
impl PermissionPolicy for AutoGrant {
    async fn decide(&self, origin: &str) -> PermissionDecision {
        info!(origin, "Granting page access");
        PermissionDecision::Granted
    }
}

/// Grants only listed origins. Denials take precedence.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    granted: HashSet<String>,
    denied: HashSet<String>,
}

impl OriginAllowList {
    pub fn new<I, S>(granted: I, denied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            granted: granted.into_iter().filter_map(|o| normalize_entry(o.as_ref())).collect(),
            denied: denied.into_iter().filter_map(|o| normalize_entry(o.as_ref())).collect(),
        }
    }

    fn decide_now(&self, origin: &str) -> PermissionDecision {
        if !self.denied.contains(origin) && self.granted.contains(origin) {
            PermissionDecision::Granted
        } else {
            PermissionDecision::Denied
        }
    }
}

#[async_trait]
impl PermissionPolicy for OriginAllowList {
    async fn decide(&self, origin: &str) -> PermissionDecision {
        self.decide_now(origin)
    }
}

/// Follows the `[permissions]` section of the live configuration.
pub struct ConfiguredPolicy {
    config: ConfigHandle,
}

impl ConfiguredPolicy {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }

    fn decide_with(permissions: &PermissionsConfig, origin: &str) -> PermissionDecision {
        let denied = permissions
            .denied_origins
            .iter()
            .filter_map(|o| normalize_entry(o))
            .any(|o| o == origin);
        if denied {
            return PermissionDecision::Denied;
        }
        match permissions.mode {
            PermissionMode::Auto => {
                info!(origin, "Granting page access");
                PermissionDecision::Granted
            }
            PermissionMode::Allowlist => {
                OriginAllowList::new(&permissions.origins, &permissions.denied_origins)
                    .decide_now(origin)
            }
        }
    }
}

#[async_trait]
impl PermissionPolicy for ConfiguredPolicy {
    async fn decide(&self, origin: &str) -> PermissionDecision {
        let config = self.config.current();
        Self::decide_with(&config.permissions, origin)
    }
}

/// Asks the policy once per origin and remembers grants for the process.
/// Denials are not cached so a config change can lift them.
pub struct PermissionGate {
    policy: Arc<dyn PermissionPolicy>,
    granted: Mutex<HashSet<String>>,
}

impl PermissionGate {
    pub fn new(policy: Arc<dyn PermissionPolicy>) -> Self {
        Self {
            policy,
            granted: Mutex::new(HashSet::new()),
        }
    }

    /// Check access to the page at `url`.
    pub async fn check(&self, url: &str) -> Result<(), ToolError> {
        let Some(origin) = origin_of(url) else {
            return Ok(());
        };
        if self.granted.lock().contains(&origin) {
            return Ok(());
        }

        match self.policy.decide(&origin).await {
            PermissionDecision::Granted => {
                self.granted.lock().insert(origin);
                Ok(())
            }
            PermissionDecision::Denied => {
                warn!(origin = %origin, "Page access denied");
                Err(ToolError::PermissionDenied(origin))
            }
        }
    }
}
