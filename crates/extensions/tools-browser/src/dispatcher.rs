//! Tool Dispatcher: routes validated tool invocations to the browser shell,
//! the action executor or the extractor.
//!
//! Surface tools run only after the target page has passed the permission
//! check and has a live page agent. Tools that navigate are followed by a
//! bounded wait for the page to settle, after which the agent is ensured
//! again. Nothing here fails the caller: every problem becomes an error
//! [`ToolResult`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tabpilot_config::{BrowserConfig, ConfigHandle};
use tabpilot_protocols::{
    DispatchOutcome, PermissionPolicy, SurfaceId, ToolDeclaration, ToolError, ToolExecutor,
    ToolResult,
};

use crate::actions::{ActionExecutor, PageAction};
use crate::catalog::browser_tools;
use crate::channel::{CdpPageChannel, PageChannel};
use crate::extractor::{
    ESCALATION_SELECTORS, ExtractMethod, ExtractOptions, ExtractionResult, Extractor,
    ExtractorSettings,
};
use crate::invocation::{ToolInvocation, ToolScope};
use crate::permissions::{ConfiguredPolicy, PermissionGate};
use crate::shell::BrowserShell;
use crate::surfaces::{BrowserError, SurfaceConfig, SurfaceRegistry, SurfaceStatus};

const NEW_DOCUMENT_URL: &str = "https://docs.google.com/document/create";
const NEW_SPREADSHEET_URL: &str = "https://docs.google.com/spreadsheets/create";

/// Dispatcher timing and thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    /// Upper bound on waiting for a navigation to settle.
    pub navigation_timeout: Duration,
    /// Status polling period while waiting.
    pub poll_interval: Duration,
    /// A page that shows no sign of navigating within this window is
    /// considered settled.
    pub navigation_grace: Duration,
    /// `extractText` escalates while its text is shorter than this.
    pub min_extract_chars: usize,
    /// Ladder threshold for `getAllContent` and `autoExtractAfterNavigation`.
    pub full_extract_chars: usize,
    pub default_settle: Duration,
    pub max_settle: Duration,
    pub page_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
            navigation_grace: Duration::from_millis(1500),
            min_extract_chars: 300,
            full_extract_chars: 600,
            default_settle: Duration::from_millis(1500),
            max_settle: Duration::from_secs(10),
            page_timeout: Duration::from_secs(15),
        }
    }
}

impl From<&BrowserConfig> for DispatchSettings {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs.max(1)),
            page_timeout: Duration::from_secs(config.page_timeout_secs.max(1)),
            ..Self::default()
        }
    }
}

/// How a navigation wait ended.
#[derive(Debug)]
struct Settled {
    status: Option<SurfaceStatus>,
    timed_out: bool,
}

pub struct BrowserDispatcher {
    shell: Arc<dyn BrowserShell>,
    channel: Arc<dyn PageChannel>,
    permissions: PermissionGate,
    extractor: Extractor,
    actions: ActionExecutor,
    declarations: Vec<ToolDeclaration>,
    settings: DispatchSettings,
}

impl BrowserDispatcher {
    pub fn new(
        shell: Arc<dyn BrowserShell>,
        channel: Arc<dyn PageChannel>,
        policy: Arc<dyn PermissionPolicy>,
        settings: DispatchSettings,
        extractor_settings: ExtractorSettings,
    ) -> Self {
        Self {
            extractor: Extractor::new(channel.clone(), extractor_settings),
            actions: ActionExecutor::new(channel.clone(), settings.page_timeout),
            permissions: PermissionGate::new(policy),
            declarations: browser_tools(),
            shell,
            channel,
            settings,
        }
    }

    /// Dispatcher over a local Chrome, following the live configuration for
    /// origin permissions.
    pub fn for_chrome(config: &ConfigHandle) -> (Self, Arc<SurfaceRegistry>) {
        let current = config.current();
        let registry = Arc::new(SurfaceRegistry::new(SurfaceConfig::from(&current.browser)));
        let channel = Arc::new(CdpPageChannel::new(registry.clone()));
        let dispatcher = Self::new(
            registry.clone(),
            channel,
            Arc::new(ConfiguredPolicy::new(config.clone())),
            DispatchSettings::from(&current.browser),
            ExtractorSettings::from(&current.browser),
        );
        (dispatcher, registry)
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    async fn run(
        &self,
        invocation: &ToolInvocation,
        target: Option<&SurfaceId>,
    ) -> Result<DispatchOutcome, ToolError> {
        match invocation.scope() {
            ToolScope::Shell => self.run_shell(invocation, target).await,
            ToolScope::Surface => {
                let (surface, reassigned) = match target {
                    Some(t) => (t.clone(), false),
                    None => (self.shell.first_surface().await.ok_or(ToolError::NoSurface)?, true),
                };
                let result = self.run_surface(invocation, &surface).await?;
                let outcome = DispatchOutcome::new(result);
                Ok(if reassigned { outcome.with_surface(surface) } else { outcome })
            }
        }
    }

    /// Permission check plus a live page agent.
    async fn ensure_surface(&self, surface: &SurfaceId) -> Result<SurfaceStatus, ToolError> {
        let status = self.shell.status(surface).await.map_err(shell_error)?;
        self.permissions.check(&status.url).await?;
        self.channel
            .ensure_ready(surface)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(status)
    }

    async fn run_surface(
        &self,
        invocation: &ToolInvocation,
        surface: &SurfaceId,
    ) -> Result<ToolResult, ToolError> {
        let before = self.ensure_surface(surface).await?;

        match invocation {
            ToolInvocation::ExtractText {
                method,
                selector,
                query,
            } => {
                let result = self
                    .extract_with_escalation(surface, *method, selector.as_deref(), query.clone())
                    .await;
                Ok(extraction_result(result, query.as_deref(), Some(&before)))
            }
            ToolInvocation::GetAllContent { query } => {
                let options = ExtractOptions::full_ladder(self.settings.full_extract_chars)
                    .with_query(query.clone());
                let result = self.extractor.extract(surface, &options).await;
                Ok(extraction_result(result, query.as_deref(), Some(&before)))
            }
            ToolInvocation::AutoExtractAfterNavigation { query, wait_ms } => {
                self.wait_for_load(surface).await;
                let settle = wait_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.settings.default_settle)
                    .min(self.settings.max_settle);
                tokio::time::sleep(settle).await;
                let status = self.ensure_surface(surface).await?;
                let options = ExtractOptions::full_ladder(self.settings.full_extract_chars)
                    .with_query(query.clone());
                let result = self.extractor.extract(surface, &options).await;
                Ok(extraction_result(result, query.as_deref(), Some(&status)))
            }
            other => {
                let action = other
                    .page_action()
                    .ok_or_else(|| ToolError::ExecutionFailed(format!("{} is not a page action", other.name())))?;
                let result = self.actions.perform(surface, &action).await;
                if !result.success || !other.expects_navigation() {
                    return Ok(result);
                }
                let expected = match &action {
                    PageAction::Navigate { url } => Some(url.as_str()),
                    _ => None,
                };
                Ok(self.reconcile(surface, &before.url, expected, result).await)
            }
        }
    }

    /// Wait for a navigation started by the last action to settle, then
    /// make sure the new document has an agent.
    async fn reconcile(
        &self,
        surface: &SurfaceId,
        before_url: &str,
        expected: Option<&str>,
        result: ToolResult,
    ) -> ToolResult {
        let settled = self.wait_for_navigation(surface, before_url, expected).await;
        let mut result = result;

        if let Some(status) = &settled.status {
            result = result.with("url", status.url.clone()).with("title", status.title.clone());
        }
        if settled.timed_out {
            warn!(surface = %surface, "Navigation did not settle in time");
            result = result.with(
                "warning",
                format!(
                    "Page did not finish loading within {} s",
                    self.settings.navigation_timeout.as_secs()
                ),
            );
        }
        if let Err(e) = self.ensure_surface(surface).await {
            debug!(surface = %surface, error = %e, "Page agent not ready after navigation");
            result = result.with("warning", format!("Page not ready after navigation: {}", e));
        }
        result
    }

    async fn wait_for_navigation(
        &self,
        surface: &SurfaceId,
        before_url: &str,
        expected: Option<&str>,
    ) -> Settled {
        let started = Instant::now();
        let mut navigating = false;
        let mut last = None;

        loop {
            tokio::time::sleep(self.settings.poll_interval).await;
            let elapsed = started.elapsed();

            if let Ok(status) = self.shell.status(surface).await {
                let reached = expected.is_some_and(|e| same_page(&status.url, e));
                if status.url != before_url || !status.is_complete() {
                    navigating = true;
                }
                let done = status.is_complete()
                    && (navigating || reached || elapsed >= self.settings.navigation_grace);
                last = Some(status);
                if done {
                    debug!(surface = %surface, navigating, elapsed_ms = elapsed.as_millis() as u64, "Navigation settled");
                    return Settled {
                        status: last,
                        timed_out: false,
                    };
                }
            }

            if elapsed >= self.settings.navigation_timeout {
                return Settled {
                    status: last,
                    timed_out: true,
                };
            }
        }
    }

    /// Poll until the surface reports a complete document, bounded by the
    /// navigation timeout.
    async fn wait_for_load(&self, surface: &SurfaceId) -> Option<SurfaceStatus> {
        let started = Instant::now();
        loop {
            let status = self.shell.status(surface).await.ok();
            if status.as_ref().is_some_and(SurfaceStatus::is_complete)
                || started.elapsed() >= self.settings.navigation_timeout
            {
                return status;
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn extract_with_escalation(
        &self,
        surface: &SurfaceId,
        method: ExtractMethod,
        selector: Option<&str>,
        query: Option<String>,
    ) -> ExtractionResult {
        let min = self.settings.min_extract_chars;
        let mut base = ExtractOptions::new(method, min).with_query(query);
        if let Some(sel) = selector {
            base = base.with_selector(sel);
        }
        let mut best = self.extractor.extract(surface, &base).await;
        if best.chars() >= min || method == ExtractMethod::Html {
            return best;
        }

        let plain = ExtractOptions {
            selector: None,
            method: ExtractMethod::Text,
            ..base
        };
        let mut attempts = vec![
            ExtractOptions {
                frames: true,
                ..plain.clone()
            },
            ExtractOptions {
                frames: true,
                scroll: true,
                ..plain.clone()
            },
        ];
        attempts.extend(
            ESCALATION_SELECTORS
                .iter()
                .map(|sel| plain.clone().with_selector(*sel)),
        );

        for options in attempts {
            let candidate = self.extractor.extract(surface, &options).await;
            if candidate.chars() > best.chars() {
                debug!(
                    method = %candidate.method_used,
                    chars = candidate.chars(),
                    previous = best.chars(),
                    "Escalated extraction improved"
                );
                best = candidate;
            }
            if best.chars() >= min {
                break;
            }
        }
        best
    }

    async fn run_shell(
        &self,
        invocation: &ToolInvocation,
        target: Option<&SurfaceId>,
    ) -> Result<DispatchOutcome, ToolError> {
        match invocation {
            ToolInvocation::OpenNewTab { url } => {
                let surface = self.shell.open_tab(url.as_deref()).await.map_err(shell_error)?;
                let status = match url {
                    Some(_) => self.wait_for_load(&surface).await,
                    None => self.shell.status(&surface).await.ok(),
                };
                let result = tab_result(ToolResult::success(), &surface, status.as_ref());
                Ok(DispatchOutcome::new(result).with_surface(surface))
            }
            ToolInvocation::CloseCurrentTab => {
                let closing = target.ok_or(ToolError::NoSurface)?;
                self.shell.close_tab(closing).await.map_err(shell_error)?;
                let remaining = self.shell.list_tabs().await.map_err(shell_error)?;
                let mut result = ToolResult::success()
                    .with("closed", closing.as_str())
                    .with("remainingTabs", remaining.len());
                match remaining.into_iter().next() {
                    Some(next) => {
                        self.shell.activate(&next.id).await.map_err(shell_error)?;
                        result = tab_result(result, &next.id, Some(&next));
                        Ok(DispatchOutcome::new(result).with_surface(next.id))
                    }
                    None => Ok(result.into()),
                }
            }
            ToolInvocation::SwitchToTabByTitle { title } => {
                let tabs = self.shell.list_tabs().await.map_err(shell_error)?;
                let needle = title.to_lowercase();
                let found = tabs
                    .iter()
                    .find(|t| t.title.to_lowercase().contains(&needle))
                    .or_else(|| tabs.iter().find(|t| t.url.to_lowercase().contains(&needle)));
                let Some(tab) = found else {
                    let titles: Vec<String> = tabs.iter().map(|t| t.title.clone()).collect();
                    return Ok(ToolResult::error(format!("No open tab title contains '{}'", title))
                        .with("availableTitles", titles)
                        .into());
                };
                self.shell.activate(&tab.id).await.map_err(shell_error)?;
                let result = tab_result(ToolResult::success(), &tab.id, Some(tab));
                Ok(DispatchOutcome::new(result).with_surface(tab.id.clone()))
            }
            ToolInvocation::SearchWeb { query, engine } => {
                let url = engine.search_url(query);
                let surface = match target {
                    Some(t) if self.shell.status(t).await.is_ok() => {
                        self.shell.navigate(t, &url).await.map_err(shell_error)?;
                        t.clone()
                    }
                    _ => self.shell.open_tab(Some(&url)).await.map_err(shell_error)?,
                };
                let status = self.wait_for_load(&surface).await;
                let mut result = ToolResult::success()
                    .with("engine", engine.as_str())
                    .with("query", query.as_str());
                result = tab_result(result, &surface, status.as_ref());
                if let Err(e) = self.ensure_surface(&surface).await {
                    result = result.with("warning", format!("Results page not ready: {}", e));
                }
                Ok(DispatchOutcome::new(result).with_surface(surface))
            }
            ToolInvocation::ListOpenTabs => {
                let tabs = self.shell.list_tabs().await.map_err(shell_error)?;
                let listed: Vec<Value> = tabs
                    .iter()
                    .map(|t| {
                        json!({
                            "id": t.id.as_str(),
                            "title": t.title,
                            "url": t.url,
                            "active": target == Some(&t.id),
                        })
                    })
                    .collect();
                Ok(ToolResult::success()
                    .with("count", listed.len())
                    .with("tabs", listed)
                    .into())
            }
            ToolInvocation::GdocsCreateDocument { title } => {
                self.create_document(NEW_DOCUMENT_URL, title.as_deref()).await
            }
            ToolInvocation::GsheetsCreateSpreadsheet { title } => {
                self.create_document(NEW_SPREADSHEET_URL, title.as_deref()).await
            }
            other => Err(ToolError::ExecutionFailed(format!(
                "{} is not a browser shell tool",
                other.name()
            ))),
        }
    }

    async fn create_document(
        &self,
        create_url: &str,
        title: Option<&str>,
    ) -> Result<DispatchOutcome, ToolError> {
        let surface = self.shell.open_tab(Some(create_url)).await.map_err(shell_error)?;
        let status = self.wait_for_load(&surface).await;
        let mut result = tab_result(ToolResult::success(), &surface, status.as_ref());

        if let Some(title) = title {
            let titled = match self.ensure_surface(&surface).await {
                Ok(_) => {
                    let action = PageAction::DocsSetTitle {
                        title: title.to_string(),
                    };
                    let outcome = self.actions.perform(&surface, &action).await;
                    outcome.success.then_some(()).ok_or_else(|| {
                        outcome.error.unwrap_or_else(|| "title not set".to_string())
                    })
                }
                Err(e) => Err(e.to_string()),
            };
            result = match titled {
                Ok(()) => result.with("documentTitle", title),
                Err(e) => result.with("warning", format!("Could not set title: {}", e)),
            };
        }
        Ok(DispatchOutcome::new(result).with_surface(surface))
    }
}

#[async_trait]
impl ToolExecutor for BrowserDispatcher {
    fn declarations(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    async fn initial_surface(&self) -> Option<SurfaceId> {
        self.shell.first_surface().await
    }

    async fn dispatch(
        &self,
        name: &str,
        args: &Map<String, Value>,
        target: Option<&SurfaceId>,
    ) -> DispatchOutcome {
        let started = Instant::now();
        let outcome = match ToolInvocation::parse(name, args) {
            Ok(invocation) => match self.run(&invocation, target).await {
                Ok(outcome) => outcome,
                Err(e) => ToolResult::error(e.to_string()).into(),
            },
            Err(e) => ToolResult::error(e.to_string()).into(),
        };

        let surface = outcome.surface.as_ref().or(target).map(SurfaceId::as_str).unwrap_or("-");
        info!(
            tool = name,
            surface,
            success = outcome.result.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool dispatched"
        );
        outcome
    }
}

fn shell_error(e: BrowserError) -> ToolError {
    ToolError::ExecutionFailed(e.to_string())
}

/// Equal up to fragment and trailing slash.
fn same_page(a: &str, b: &str) -> bool {
    fn key(u: &str) -> &str {
        let u = u.split('#').next().unwrap_or(u);
        u.trim_end_matches('/')
    }
    key(a) == key(b)
}

fn tab_result(result: ToolResult, surface: &SurfaceId, status: Option<&SurfaceStatus>) -> ToolResult {
    let result = result.with("tabId", surface.as_str());
    match status {
        Some(s) => result.with("url", s.url.clone()).with("title", s.title.clone()),
        None => result,
    }
}

fn extraction_result(
    extraction: ExtractionResult,
    query: Option<&str>,
    status: Option<&SurfaceStatus>,
) -> ToolResult {
    let (url, title) = status
        .map(|s| (s.url.clone(), s.title.clone()))
        .unwrap_or_default();

    if query.is_some() && extraction.looks_like_wrong_page() {
        let preview: String = extraction.text.chars().take(200).collect();
        return ToolResult::error(format!(
            "The current page does not appear to contain content about '{}'",
            query.unwrap_or_default()
        ))
        .with("url", url)
        .with("title", title)
        .with("preview", preview);
    }

    let length = extraction.chars();
    ToolResult::success()
        .with("text", extraction.text)
        .with("methodUsed", extraction.method_used)
        .with("qualityScore", extraction.quality_score)
        .with("length", length)
        .with("url", url)
        .with("title", title)
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
