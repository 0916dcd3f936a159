//! Test doubles for the page channel and the browser shell.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use tabpilot_protocols::SurfaceId;

use crate::channel::{ChannelError, PageChannel, PageRequest};
use crate::shell::BrowserShell;
use crate::surfaces::{BrowserError, SurfaceStatus};

type Handler = Box<dyn Fn(&PageRequest) -> Result<Value, ChannelError> + Send + Sync>;

/// Answers page ops from a closure and records every request.
pub(crate) struct FakeChannel {
    handler: Handler,
    pub requests: Mutex<Vec<(SurfaceId, PageRequest)>>,
    pub ensures: AtomicUsize,
    pub ready: Mutex<bool>,
}

impl FakeChannel {
    pub fn new(
        handler: impl Fn(&PageRequest) -> Result<Value, ChannelError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            ensures: AtomicUsize::new(0),
            ready: Mutex::new(true),
        }
    }

    pub fn ops(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(_, r)| r.op.clone()).collect()
    }

    pub fn requests_for(&self, op: &str) -> Vec<PageRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|(_, r)| r.op == op)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait]
impl PageChannel for FakeChannel {
    async fn ensure_ready(&self, _surface: &SurfaceId) -> Result<(), ChannelError> {
        self.ensures.fetch_add(1, Ordering::SeqCst);
        if *self.ready.lock() {
            Ok(())
        } else {
            Err(ChannelError::Unavailable("no agent".to_string()))
        }
    }

    async fn request(
        &self,
        surface: &SurfaceId,
        request: PageRequest,
        _timeout: Duration,
    ) -> Result<Value, ChannelError> {
        let reply = (self.handler)(&request);
        self.requests.lock().push((surface.clone(), request));
        reply
    }
}

/// In-memory tab list. `navigate` and `open_tab` complete immediately.
pub(crate) struct FakeShell {
    pub tabs: Mutex<Vec<SurfaceStatus>>,
    pub activated: Mutex<Vec<SurfaceId>>,
    pub navigations: Mutex<Vec<(SurfaceId, String)>>,
    /// Statuses handed out by `status` before falling back to the tab list.
    pub scripted_status: Mutex<Vec<SurfaceStatus>>,
    counter: AtomicUsize,
}

impl FakeShell {
    pub fn new() -> Self {
        Self {
            tabs: Mutex::new(Vec::new()),
            activated: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
            scripted_status: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn with_tab(self, url: &str, title: &str) -> Self {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.tabs.lock().push(status(&format!("tab-{n}"), url, title, "complete"));
        self
    }

    pub fn set_url(&self, surface: &SurfaceId, url: &str) {
        if let Some(tab) = self.tabs.lock().iter_mut().find(|t| &t.id == surface) {
            tab.url = url.to_string();
        }
    }
}

pub(crate) fn status(id: &str, url: &str, title: &str, ready: &str) -> SurfaceStatus {
    SurfaceStatus {
        id: SurfaceId::new(id),
        url: url.to_string(),
        title: title.to_string(),
        ready_state: ready.to_string(),
    }
}

#[async_trait]
impl BrowserShell for FakeShell {
    async fn open_tab(&self, url: Option<&str>) -> Result<SurfaceId, BrowserError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("tab-{n}");
        self.tabs
            .lock()
            .push(status(&id, url.unwrap_or("about:blank"), "", "complete"));
        Ok(SurfaceId::new(id))
    }

    async fn close_tab(&self, surface: &SurfaceId) -> Result<(), BrowserError> {
        let mut tabs = self.tabs.lock();
        let before = tabs.len();
        tabs.retain(|t| &t.id != surface);
        if tabs.len() == before {
            return Err(BrowserError::SurfaceNotFound(surface.to_string()));
        }
        Ok(())
    }

    async fn activate(&self, surface: &SurfaceId) -> Result<(), BrowserError> {
        self.activated.lock().push(surface.clone());
        Ok(())
    }

    async fn list_tabs(&self) -> Result<Vec<SurfaceStatus>, BrowserError> {
        Ok(self.tabs.lock().clone())
    }

    async fn status(&self, surface: &SurfaceId) -> Result<SurfaceStatus, BrowserError> {
        {
            let mut scripted = self.scripted_status.lock();
            if !scripted.is_empty() {
                return Ok(scripted.remove(0));
            }
        }
        self.tabs
            .lock()
            .iter()
            .find(|t| &t.id == surface)
            .cloned()
            .ok_or_else(|| BrowserError::SurfaceNotFound(surface.to_string()))
    }

    async fn navigate(&self, surface: &SurfaceId, url: &str) -> Result<(), BrowserError> {
        self.navigations.lock().push((surface.clone(), url.to_string()));
        self.set_url(surface, url);
        Ok(())
    }

    async fn first_surface(&self) -> Option<SurfaceId> {
        self.tabs.lock().first().map(|t| t.id.clone())
    }
}
