//! SurfaceRegistry: connection management and tab bookkeeping.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Child;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use tabpilot_protocols::SurfaceId;

use super::launch::launch_chrome;
use super::{BrowserError, SurfaceConfig, SurfaceStatus};
use crate::cdp::{CdpClient, PageSession};
use crate::shell::BrowserShell;

/// Launch wait: 30 probes, 200ms apart.
const LAUNCH_PROBES: u32 = 30;
const LAUNCH_PROBE_INTERVAL: Duration = Duration::from_millis(200);

struct SurfaceState {
    session: Arc<PageSession>,
    seq: u64,
}

/// Owns the CDP connection and the `tab-N` surfaces attached over it.
pub struct SurfaceRegistry {
    config: SurfaceConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    surfaces: RwLock<HashMap<SurfaceId, SurfaceState>>,
    counter: AtomicU64,
    /// Chrome process handle (if we launched it).
    chrome_process: RwLock<Option<Child>>,
    connect_lock: Mutex<()>,
}

impl SurfaceRegistry {
    /// Create a registry. Nothing connects until first use.
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            surfaces: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(0),
            chrome_process: RwLock::new(None),
            connect_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    async fn is_chrome_running(&self) -> bool {
        CdpClient::probe(&self.config.endpoint()).await.is_ok()
    }

    /// Connect to the browser, launching it if necessary, and adopt the
    /// tabs that are already open.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        let _guard = self.connect_lock.lock().await;

        if let Some(client) = self.client.read().await.as_ref() {
            if client.is_connected() {
                return Ok(());
            }
        }
        // A dead connection invalidates every session.
        self.surfaces.write().await.clear();

        if !self.is_chrome_running().await {
            if !self.config.launch {
                return Err(BrowserError::ConnectionFailed(format!(
                    "nothing listening at {} and launch is disabled",
                    self.config.endpoint()
                )));
            }
            info!("Chrome not running on port {}, launching...", self.config.debug_port);

            let child = launch_chrome(&self.config)?;
            *self.chrome_process.write().await = Some(child);

            let mut ready = false;
            for _ in 0..LAUNCH_PROBES {
                tokio::time::sleep(LAUNCH_PROBE_INTERVAL).await;
                if self.is_chrome_running().await {
                    ready = true;
                    break;
                }
            }

            if !ready {
                return Err(BrowserError::LaunchFailed(
                    "Chrome failed to start within timeout".to_string(),
                ));
            }
        } else {
            info!("Chrome already running on port {}", self.config.debug_port);
        }

        let client = CdpClient::connect(&self.config.endpoint()).await?;
        *self.client.write().await = Some(Arc::new(client));
        info!("Connected to Chrome at {}", self.config.endpoint());

        drop(_guard);
        self.sync_targets().await?;
        Ok(())
    }

    /// Ensure the browser is connected before use.
    pub async fn ensure_connected(&self) -> Result<(), BrowserError> {
        let connected = self
            .client
            .read()
            .await
            .as_ref()
            .is_some_and(|c| c.is_connected());
        if !connected {
            self.connect().await?;
        }
        Ok(())
    }

    async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Page session behind a surface.
    pub(crate) async fn session(&self, surface: &SurfaceId) -> Result<Arc<PageSession>, BrowserError> {
        self.ensure_connected().await?;
        let surfaces = self.surfaces.read().await;
        let state = surfaces
            .get(surface)
            .ok_or_else(|| BrowserError::SurfaceNotFound(surface.to_string()))?;
        Ok(state.session.clone())
    }

    async fn register(&self, session: PageSession) -> SurfaceId {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = SurfaceId::new(format!("tab-{}", seq));
        debug!("Registered surface {} for target {}", id, session.target_id());
        self.surfaces.write().await.insert(
            id.clone(),
            SurfaceState {
                session: Arc::new(session),
                seq,
            },
        );
        id
    }

    /// Drop surfaces whose targets are gone and adopt tabs opened outside
    /// our control (user actions, `target=_blank`).
    async fn sync_targets(&self) -> Result<(), BrowserError> {
        let client = self.client().await?;
        let targets: Vec<_> = client
            .get_targets()
            .await?
            .into_iter()
            .filter(|t| t.is_user_page())
            .collect();
        let live: HashSet<&str> = targets.iter().map(|t| t.target_id.as_str()).collect();

        let known: HashSet<String> = {
            let mut surfaces = self.surfaces.write().await;
            surfaces.retain(|id, state| {
                let keep = live.contains(state.session.target_id());
                if !keep {
                    debug!("Surface {} closed outside the registry", id);
                }
                keep
            });
            surfaces
                .values()
                .map(|s| s.session.target_id().to_string())
                .collect()
        };

        for target in targets.iter().filter(|t| !known.contains(&t.target_id)) {
            match client.attach_page(&target.target_id).await {
                Ok(session) => {
                    let id = self.register(session).await;
                    info!("Adopted tab {} ({})", id, target.url);
                }
                Err(e) => warn!("Failed to attach to target {}: {}", target.target_id, e),
            }
        }
        Ok(())
    }

    async fn ordered_ids(&self) -> Vec<SurfaceId> {
        let surfaces = self.surfaces.read().await;
        let mut ids: Vec<(u64, SurfaceId)> = surfaces
            .iter()
            .map(|(id, state)| (state.seq, id.clone()))
            .collect();
        ids.sort_by_key(|(seq, _)| *seq);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Close the browser connection.
    pub async fn close(&self) -> Result<(), BrowserError> {
        self.surfaces.write().await.clear();
        let _ = self.client.write().await.take();
        info!("Browser connection closed");
        Ok(())
    }

    /// Shutdown Chrome if we launched it.
    pub async fn shutdown_chrome(&self) -> Result<(), BrowserError> {
        self.close().await?;
        if let Some(mut child) = self.chrome_process.write().await.take() {
            info!("Shutting down Chrome...");
            let _ = child.kill().await;
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserShell for SurfaceRegistry {
    async fn open_tab(&self, url: Option<&str>) -> Result<SurfaceId, BrowserError> {
        self.ensure_connected().await?;
        let client = self.client().await?;
        let session = client.create_page(url).await?;
        let id = self.register(session).await;
        debug!("Opened surface {}: {}", id, url.unwrap_or("about:blank"));
        Ok(id)
    }

    async fn close_tab(&self, surface: &SurfaceId) -> Result<(), BrowserError> {
        self.ensure_connected().await?;
        let state = self
            .surfaces
            .write()
            .await
            .remove(surface)
            .ok_or_else(|| BrowserError::SurfaceNotFound(surface.to_string()))?;
        let client = self.client().await?;
        client.close_page(state.session.target_id()).await?;
        debug!("Closed surface {}", surface);
        Ok(())
    }

    async fn activate(&self, surface: &SurfaceId) -> Result<(), BrowserError> {
        let session = self.session(surface).await?;
        let client = self.client().await?;
        client.activate_page(session.target_id()).await?;
        Ok(())
    }

    async fn list_tabs(&self) -> Result<Vec<SurfaceStatus>, BrowserError> {
        self.ensure_connected().await?;
        self.sync_targets().await?;

        let mut tabs = Vec::new();
        for id in self.ordered_ids().await {
            match self.status(&id).await {
                Ok(status) => tabs.push(status),
                Err(e) => warn!("Skipping surface {}: {}", id, e),
            }
        }
        Ok(tabs)
    }

    async fn status(&self, surface: &SurfaceId) -> Result<SurfaceStatus, BrowserError> {
        let session = self.session(surface).await?;
        match session.document_state().await {
            Ok(state) => Ok(SurfaceStatus {
                id: surface.clone(),
                url: state.url,
                title: state.title,
                ready_state: state.ready_state,
            }),
            Err(e) => {
                // No execution context mid-navigation; the browser still knows the target.
                debug!("document state unavailable for {}: {}", surface, e);
                let client = self.client().await?;
                let info = client.target_info(session.target_id()).await?;
                Ok(SurfaceStatus {
                    id: surface.clone(),
                    url: info.url,
                    title: info.title,
                    ready_state: "loading".to_string(),
                })
            }
        }
    }

    async fn navigate(&self, surface: &SurfaceId, url: &str) -> Result<(), BrowserError> {
        let session = self.session(surface).await?;
        session.navigate(url, self.config.navigation_timeout).await?;
        debug!("Navigated {} to {}", surface, url);
        Ok(())
    }

    async fn first_surface(&self) -> Option<SurfaceId> {
        if let Err(e) = self.ensure_connected().await {
            warn!("Browser unavailable: {}", e);
            return None;
        }
        if let Err(e) = self.sync_targets().await {
            warn!("Failed to list targets: {}", e);
        }
        self.ordered_ids().await.into_iter().next()
    }
}
