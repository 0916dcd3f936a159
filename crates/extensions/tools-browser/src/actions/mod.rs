//! Page Action Executor.
//!
//! Each [`PageAction`] maps onto one or a few page agent ops. Failures come
//! back as error results, never as faults.

mod profiles;
mod redirect;
mod scoring;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use tabpilot_protocols::{SurfaceId, ToolResult};

use crate::channel::{ChannelError, PageChannel, PageRequest};

pub use profiles::{PROFILES, ResultSelectors, ScoreWeights, SiteProfile, profile_for};
pub use redirect::unwrap_redirect;
pub use scoring::{
    AnchorCandidate, MatchKind, ScoredAnchor, available_domains, best_match, match_kind,
    normalize_domain, score_candidates,
};

/// Default wait for `waitForElement`.
pub const DEFAULT_WAIT_MS: u64 = 8000;

/// Longest wait a model may request for `waitForElement`.
pub const MAX_WAIT_MS: u64 = 30_000;

/// Extra channel slack on top of an in-page wait.
const WAIT_SLACK: Duration = Duration::from_secs(2);

const DEFAULT_LINK_LIMIT: usize = 50;
const DEFAULT_RESULT_LIMIT: usize = 10;
const AVAILABLE_DOMAINS_LIMIT: usize = 20;

/// One page-local action.
#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    Scroll { y: f64 },
    Click { selector: String },
    Fill { selector: String, value: String },
    InsertText { selector: Option<String>, text: String },
    Focus { selector: String },
    SelectOption { selector: String, value: String },
    PressKey { key: String },
    Navigate { url: String },
    WaitForElement { selector: String, timeout_ms: u64 },
    ClickLinkByText { text: String, exact: bool },
    ReadVisibleLinks { limit: Option<usize> },
    GetSearchResults { limit: Option<usize> },
    ClickResultByDomain { domain: String },
    DocsInsertText { text: String },
    DocsBold,
    DocsSetTitle { title: String },
    SheetsSetCell { cell: String, value: String },
}

impl PageAction {
    pub fn name(&self) -> &'static str {
        match self {
            PageAction::Scroll { .. } => "scroll",
            PageAction::Click { .. } => "click",
            PageAction::Fill { .. } => "fill",
            PageAction::InsertText { .. } => "insertText",
            PageAction::Focus { .. } => "focus",
            PageAction::SelectOption { .. } => "selectOption",
            PageAction::PressKey { .. } => "pressKey",
            PageAction::Navigate { .. } => "navigate",
            PageAction::WaitForElement { .. } => "waitForElement",
            PageAction::ClickLinkByText { .. } => "clickLinkByText",
            PageAction::ReadVisibleLinks { .. } => "readVisibleLinks",
            PageAction::GetSearchResults { .. } => "getSearchResults",
            PageAction::ClickResultByDomain { .. } => "clickResultByDomain",
            PageAction::DocsInsertText { .. } => "docs.insertText",
            PageAction::DocsBold => "docs.bold",
            PageAction::DocsSetTitle { .. } => "docs.setTitle",
            PageAction::SheetsSetCell { .. } => "sheets.setCell",
        }
    }

    /// Single-op actions as `(op, args)`.
    fn simple_request(&self) -> Option<PageRequest> {
        let request = match self {
            PageAction::Scroll { y } => PageRequest::new("scroll", json!({ "y": y })),
            PageAction::Click { selector } => {
                PageRequest::new("click", json!({ "selector": selector }))
            }
            PageAction::Fill { selector, value } => {
                PageRequest::new("fill", json!({ "selector": selector, "value": value }))
            }
            PageAction::InsertText { selector, text } => {
                PageRequest::new("insertText", json!({ "selector": selector, "text": text }))
            }
            PageAction::Focus { selector } => {
                PageRequest::new("focus", json!({ "selector": selector }))
            }
            PageAction::SelectOption { selector, value } => {
                PageRequest::new("selectOption", json!({ "selector": selector, "value": value }))
            }
            PageAction::PressKey { key } => PageRequest::new("pressKey", json!({ "key": key })),
            PageAction::Navigate { url } => PageRequest::new("navigate", json!({ "url": url })),
            PageAction::WaitForElement {
                selector,
                timeout_ms,
            } => PageRequest::new(
                "waitForElement",
                json!({ "selector": selector, "timeoutMs": timeout_ms }),
            ),
            PageAction::ClickLinkByText { text, exact } => {
                PageRequest::new("clickLinkByText", json!({ "text": text, "exact": exact }))
            }
            PageAction::DocsInsertText { text } => {
                PageRequest::new("docs.insertText", json!({ "text": text }))
            }
            PageAction::DocsBold => PageRequest::op("docs.bold"),
            PageAction::DocsSetTitle { title } => {
                PageRequest::new("docs.setTitle", json!({ "title": title }))
            }
            PageAction::SheetsSetCell { cell, value } => {
                PageRequest::new("sheets.setCell", json!({ "cell": cell, "value": value }))
            }
            PageAction::ReadVisibleLinks { .. }
            | PageAction::GetSearchResults { .. }
            | PageAction::ClickResultByDomain { .. } => return None,
        };
        Some(request)
    }
}

pub struct ActionExecutor {
    channel: Arc<dyn PageChannel>,
    request_timeout: Duration,
}

impl ActionExecutor {
    pub fn new(channel: Arc<dyn PageChannel>, request_timeout: Duration) -> Self {
        Self {
            channel,
            request_timeout,
        }
    }

    pub async fn perform(&self, surface: &SurfaceId, action: &PageAction) -> ToolResult {
        debug!(action = action.name(), surface = %surface, "Performing page action");
        let outcome = match action {
            PageAction::ReadVisibleLinks { limit } => self.visible_links(surface, *limit).await,
            PageAction::GetSearchResults { limit } => self.search_results(surface, *limit).await,
            PageAction::ClickResultByDomain { domain } => {
                self.click_result_by_domain(surface, domain).await
            }
            other => match other.simple_request() {
                Some(request) => self
                    .send(surface, request, self.timeout_for(other))
                    .await
                    .map(ToolResult::success_json),
                None => Ok(ToolResult::error("unsupported action")),
            },
        };
        outcome.unwrap_or_else(|e| ToolResult::error(e.to_string()))
    }

    fn timeout_for(&self, action: &PageAction) -> Duration {
        match action {
            PageAction::WaitForElement { timeout_ms, .. } => {
                Duration::from_millis(*timeout_ms) + WAIT_SLACK
            }
            _ => self.request_timeout,
        }
    }

    async fn send(
        &self,
        surface: &SurfaceId,
        request: PageRequest,
        timeout: Duration,
    ) -> Result<Value, ChannelError> {
        self.channel.request(surface, request, timeout).await
    }

    async fn page_url(&self, surface: &SurfaceId) -> String {
        self.send(surface, PageRequest::op("page.info"), self.request_timeout)
            .await
            .ok()
            .and_then(|v| v.get("url").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default()
    }

    async fn visible_links(
        &self,
        surface: &SurfaceId,
        limit: Option<usize>,
    ) -> Result<ToolResult, ChannelError> {
        let limit = limit.unwrap_or(DEFAULT_LINK_LIMIT);
        let raw = self
            .send(surface, PageRequest::new("links.visible", json!({ "limit": limit })), self.request_timeout)
            .await?;

        let mut seen = HashSet::new();
        let links: Vec<Value> = raw
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|link| {
                let href = unwrap_redirect(link.get("href")?.as_str()?);
                let text = link.get("text").and_then(Value::as_str).unwrap_or_default();
                seen.insert(href.clone())
                    .then(|| json!({ "text": text, "href": href }))
            })
            .take(limit)
            .collect();

        Ok(ToolResult::success()
            .with("count", links.len())
            .with("links", links))
    }

    async fn search_results(
        &self,
        surface: &SurfaceId,
        limit: Option<usize>,
    ) -> Result<ToolResult, ChannelError> {
        let limit = limit.unwrap_or(DEFAULT_RESULT_LIMIT);
        let url = self.page_url(surface).await;
        let profile = profile_for(&url);

        let mut results = Vec::new();
        if profile.has_structured_results() {
            let sel = &profile.results;
            let args = json!({
                "container": sel.container,
                "title": sel.title,
                "link": sel.link,
                "snippet": sel.snippet,
                "limit": limit,
            });
            let raw = self
                .send(surface, PageRequest::new("results.collect", args), self.request_timeout)
                .await?;
            results = collect_results(&raw, "title", limit);
        }

        let source = if results.is_empty() {
            let raw = self
                .send(surface, PageRequest::new("links.visible", json!({ "limit": limit })), self.request_timeout)
                .await?;
            results = collect_results(&raw, "text", limit);
            "links"
        } else {
            "results"
        };
        debug!(engine = profile.name, source, count = results.len(), "Collected search results");

        Ok(ToolResult::success()
            .with("engine", profile.name)
            .with("source", source)
            .with("count", results.len())
            .with("results", results))
    }

    async fn click_result_by_domain(
        &self,
        surface: &SurfaceId,
        domain: &str,
    ) -> Result<ToolResult, ChannelError> {
        let url = self.page_url(surface).await;
        let profile = profile_for(&url);
        let raw = self
            .send(
                surface,
                PageRequest::new("anchors.candidates", json!({ "primary": profile.primary_anchor })),
                self.request_timeout,
            )
            .await?;
        let candidates: Vec<AnchorCandidate> = serde_json::from_value(raw)
            .map_err(|e| ChannelError::Protocol(e.to_string()))?;

        let Some(best) = best_match(&candidates, domain, &profile.weights) else {
            let available = available_domains(&candidates, AVAILABLE_DOMAINS_LIMIT);
            debug!(domain, candidates = candidates.len(), "No result matches domain");
            return Ok(ToolResult::error(format!("No result link matches domain '{}'", domain))
                .with("domain", domain)
                .with("availableDomains", available));
        };
        debug!(domain, href = %best.target, score = best.score, kind = best.kind.as_str(), "Selected result");

        // Skip the tracking hop when the destination is known.
        let method = if best.target != best.href {
            self.send(surface, PageRequest::new("navigate", json!({ "url": best.target })), self.request_timeout)
                .await?;
            "navigate".to_string()
        } else {
            let clicked = self
                .send(
                    surface,
                    PageRequest::new("anchors.click", json!({ "index": best.index, "href": best.href })),
                    self.request_timeout,
                )
                .await?;
            clicked
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or("click")
                .to_string()
        };

        Ok(ToolResult::success()
            .with("domain", domain)
            .with("href", best.target)
            .with("text", best.text)
            .with("match", best.kind.as_str())
            .with("score", best.score)
            .with("method", method))
    }
}

/// Normalize result entries to `{title, href, snippet}` with unwrapped,
/// distinct hrefs. `title_key` names the field holding the label.
fn collect_results(raw: &Value, title_key: &str, limit: usize) -> Vec<Value> {
    let mut seen = HashSet::new();
    raw.as_array()
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let href = unwrap_redirect(entry.get("href")?.as_str()?);
            if !href.starts_with("http") || !seen.insert(href.clone()) {
                return None;
            }
            let title = entry.get(title_key).and_then(Value::as_str).unwrap_or_default();
            let snippet = entry.get("snippet").and_then(Value::as_str).unwrap_or_default();
            Some(json!({ "title": title, "href": href, "snippet": snippet }))
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
