//! Typed tool invocations.
//!
//! Model-supplied arguments are validated here, once, at the dispatch
//! boundary. Each tool name maps to exactly one variant.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use tabpilot_protocols::ToolError;

use crate::actions::{DEFAULT_WAIT_MS, MAX_WAIT_MS, PageAction};
use crate::extractor::ExtractMethod;
use crate::search::SearchEngine;

static A1_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{1,3}[1-9][0-9]{0,6}$").expect("valid regex"));

/// Whether a tool acts inside a page or on the browser itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolScope {
    Surface,
    Shell,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    ScrollTo { y: f64 },
    ClickSelector { selector: String },
    FillSelector { selector: String, value: String },
    InsertText { text: String, selector: Option<String> },
    FocusSelector { selector: String },
    SelectOption { selector: String, value: String },
    PressKey { key: String },
    ExtractText {
        method: ExtractMethod,
        selector: Option<String>,
        query: Option<String>,
    },
    GetAllContent { query: Option<String> },
    AutoExtractAfterNavigation { query: Option<String>, wait_ms: Option<u64> },
    Navigate { url: String },
    WaitForSelector { selector: String, timeout_ms: u64 },
    ClickLinkByText { text: String, exact: bool },
    GetLinksOnPage { limit: Option<usize> },
    GetSearchResults { limit: Option<usize> },
    ClickSearchResultByDomain { domain: String },
    OpenNewTab { url: Option<String> },
    CloseCurrentTab,
    SwitchToTabByTitle { title: String },
    SearchWeb { query: String, engine: SearchEngine },
    ListOpenTabs,
    GdocsCreateDocument { title: Option<String> },
    GdocsInsertText { text: String },
    GdocsBoldSelection,
    GsheetsCreateSpreadsheet { title: Option<String> },
    GsheetsSetCell { cell: String, value: String },
}

/// Argument accessors that report errors against one tool.
struct Args<'a> {
    tool: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn invalid(&self, key: &str, message: impl Into<String>) -> ToolError {
        ToolError::InvalidArgument {
            tool: self.tool.to_string(),
            argument: key.to_string(),
            message: message.into(),
        }
    }

    fn missing(&self, key: &str) -> ToolError {
        ToolError::MissingArgument {
            tool: self.tool.to_string(),
            argument: key.to_string(),
        }
    }

    /// String or number, trimmed for emptiness checks only.
    fn text(&self, key: &str) -> Result<Option<String>, ToolError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(self.invalid(key, "expected a string")),
        }
    }

    fn required(&self, key: &str) -> Result<String, ToolError> {
        match self.text(key)? {
            Some(s) => Ok(s),
            None if self.present(key).is_some() => Err(self.invalid(key, "must not be empty")),
            None => Err(self.missing(key)),
        }
    }

    fn optional(&self, key: &str) -> Result<Option<String>, ToolError> {
        self.text(key)
    }

    fn number(&self, key: &str) -> Result<Option<f64>, ToolError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a number")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a number")),
            Some(_) => Err(self.invalid(key, "expected a number")),
        }
    }

    fn required_number(&self, key: &str) -> Result<f64, ToolError> {
        self.number(key)?.ok_or_else(|| self.missing(key))
    }

    fn count(&self, key: &str) -> Result<Option<u64>, ToolError> {
        match self.number(key)? {
            None => Ok(None),
            Some(f) if f < 0.0 => Err(self.invalid(key, "must not be negative")),
            Some(f) => Ok(Some(f.round() as u64)),
        }
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, ToolError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" | "" => Ok(Some(false)),
                _ => Err(self.invalid(key, "expected a boolean")),
            },
            Some(_) => Err(self.invalid(key, "expected a boolean")),
        }
    }
}

/// Accept bare hosts by assuming https; refuse script URLs.
fn normalize_url(args: &Args<'_>, key: &str, raw: String) -> Result<String, ToolError> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("javascript:") {
        return Err(args.invalid(key, "script URLs are not allowed"));
    }
    if trimmed.contains("://") || lower.starts_with("about:") || lower.starts_with("data:") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{}", trimmed.trim_start_matches('/')))
    }
}

impl ToolInvocation {
    /// Validate `args` for tool `name`. Unknown extra fields are ignored.
    pub fn parse(name: &str, map: &Map<String, Value>) -> Result<Self, ToolError> {
        let args = Args { tool: name, map };
        let invocation = match name {
            "scrollTo" => Self::ScrollTo {
                y: args.required_number("y")?,
            },
            "clickSelector" => Self::ClickSelector {
                selector: args.required("selector")?,
            },
            "fillSelector" => Self::FillSelector {
                selector: args.required("selector")?,
                value: args.required("value")?,
            },
            "insertText" => Self::InsertText {
                text: args.required("text")?,
                selector: args.optional("selector")?,
            },
            "focusSelector" => Self::FocusSelector {
                selector: args.required("selector")?,
            },
            "selectOption" => Self::SelectOption {
                selector: args.required("selector")?,
                value: args.required("value")?,
            },
            "pressKey" => Self::PressKey {
                key: args.required("key")?,
            },
            "extractText" => Self::ExtractText {
                method: match args.optional("method")? {
                    None => ExtractMethod::default(),
                    Some(m) => ExtractMethod::parse(&m).ok_or_else(|| {
                        args.invalid("method", "expected one of text, html, full, structured, clean")
                    })?,
                },
                selector: args.optional("selector")?,
                query: args.optional("query")?,
            },
            "getAllContent" => Self::GetAllContent {
                query: args.optional("query")?,
            },
            "autoExtractAfterNavigation" => Self::AutoExtractAfterNavigation {
                query: args.optional("query")?,
                wait_ms: args.count("waitMs")?,
            },
            "navigate" => {
                let url = args.required("url")?;
                Self::Navigate {
                    url: normalize_url(&args, "url", url)?,
                }
            }
            "waitForSelector" => Self::WaitForSelector {
                selector: args.required("selector")?,
                timeout_ms: args
                    .count("timeoutMs")?
                    .unwrap_or(DEFAULT_WAIT_MS)
                    .min(MAX_WAIT_MS),
            },
            "clickLinkByText" => Self::ClickLinkByText {
                text: args.required("text")?,
                exact: args.flag("exact")?.unwrap_or(false),
            },
            "getLinksOnPage" => Self::GetLinksOnPage {
                limit: args.count("limit")?.map(|n| n as usize),
            },
            "getSearchResults" => Self::GetSearchResults {
                limit: args.count("limit")?.map(|n| n as usize),
            },
            "clickSearchResultByDomain" => Self::ClickSearchResultByDomain {
                domain: args.required("domain")?,
            },
            "openNewTab" => Self::OpenNewTab {
                url: match args.optional("url")? {
                    Some(url) => Some(normalize_url(&args, "url", url)?),
                    None => None,
                },
            },
            "closeCurrentTab" => Self::CloseCurrentTab,
            "switchToTabByTitle" => Self::SwitchToTabByTitle {
                title: args.required("title")?,
            },
            "searchWeb" => Self::SearchWeb {
                query: args.required("query")?,
                engine: match args.optional("engine")? {
                    None => SearchEngine::default(),
                    Some(e) => SearchEngine::parse(&e).ok_or_else(|| {
                        args.invalid("engine", "expected one of google, bing, duckduckgo")
                    })?,
                },
            },
            "listOpenTabs" => Self::ListOpenTabs,
            "gdocsCreateDocument" => Self::GdocsCreateDocument {
                title: args.optional("title")?,
            },
            "gdocsInsertText" => Self::GdocsInsertText {
                text: args.required("text")?,
            },
            "gdocsBoldSelection" => Self::GdocsBoldSelection,
            "gsheetsCreateSpreadsheet" => Self::GsheetsCreateSpreadsheet {
                title: args.optional("title")?,
            },
            "gsheetsSetCell" => {
                let cell = args.required("cell")?;
                if !A1_CELL.is_match(cell.trim()) {
                    return Err(args.invalid("cell", "expected A1 notation such as B7"));
                }
                Self::GsheetsSetCell {
                    cell: cell.trim().to_ascii_uppercase(),
                    value: args.required("value")?,
                }
            }
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(invocation)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ScrollTo { .. } => "scrollTo",
            Self::ClickSelector { .. } => "clickSelector",
            Self::FillSelector { .. } => "fillSelector",
            Self::InsertText { .. } => "insertText",
            Self::FocusSelector { .. } => "focusSelector",
            Self::SelectOption { .. } => "selectOption",
            Self::PressKey { .. } => "pressKey",
            Self::ExtractText { .. } => "extractText",
            Self::GetAllContent { .. } => "getAllContent",
            Self::AutoExtractAfterNavigation { .. } => "autoExtractAfterNavigation",
            Self::Navigate { .. } => "navigate",
            Self::WaitForSelector { .. } => "waitForSelector",
            Self::ClickLinkByText { .. } => "clickLinkByText",
            Self::GetLinksOnPage { .. } => "getLinksOnPage",
            Self::GetSearchResults { .. } => "getSearchResults",
            Self::ClickSearchResultByDomain { .. } => "clickSearchResultByDomain",
            Self::OpenNewTab { .. } => "openNewTab",
            Self::CloseCurrentTab => "closeCurrentTab",
            Self::SwitchToTabByTitle { .. } => "switchToTabByTitle",
            Self::SearchWeb { .. } => "searchWeb",
            Self::ListOpenTabs => "listOpenTabs",
            Self::GdocsCreateDocument { .. } => "gdocsCreateDocument",
            Self::GdocsInsertText { .. } => "gdocsInsertText",
            Self::GdocsBoldSelection => "gdocsBoldSelection",
            Self::GsheetsCreateSpreadsheet { .. } => "gsheetsCreateSpreadsheet",
            Self::GsheetsSetCell { .. } => "gsheetsSetCell",
        }
    }

    pub fn scope(&self) -> ToolScope {
        match self {
            Self::OpenNewTab { .. }
            | Self::CloseCurrentTab
            | Self::SwitchToTabByTitle { .. }
            | Self::SearchWeb { .. }
            | Self::ListOpenTabs
            | Self::GdocsCreateDocument { .. }
            | Self::GsheetsCreateSpreadsheet { .. } => ToolScope::Shell,
            _ => ToolScope::Surface,
        }
    }

    /// Tools after which the dispatcher waits for the page to settle.
    pub fn expects_navigation(&self) -> bool {
        matches!(
            self,
            Self::Navigate { .. } | Self::ClickLinkByText { .. } | Self::ClickSearchResultByDomain { .. }
        )
    }

    /// The page action behind a plain surface tool, if it is one.
    pub fn page_action(&self) -> Option<PageAction> {
        let action = match self {
            Self::ScrollTo { y } => PageAction::Scroll { y: *y },
            Self::ClickSelector { selector } => PageAction::Click {
                selector: selector.clone(),
            },
            Self::FillSelector { selector, value } => PageAction::Fill {
                selector: selector.clone(),
                value: value.clone(),
            },
            Self::InsertText { text, selector } => PageAction::InsertText {
                selector: selector.clone(),
                text: text.clone(),
            },
            Self::FocusSelector { selector } => PageAction::Focus {
                selector: selector.clone(),
            },
            Self::SelectOption { selector, value } => PageAction::SelectOption {
                selector: selector.clone(),
                value: value.clone(),
            },
            Self::PressKey { key } => PageAction::PressKey { key: key.clone() },
            Self::Navigate { url } => PageAction::Navigate { url: url.clone() },
            Self::WaitForSelector {
                selector,
                timeout_ms,
            } => PageAction::WaitForElement {
                selector: selector.clone(),
                timeout_ms: *timeout_ms,
            },
            Self::ClickLinkByText { text, exact } => PageAction::ClickLinkByText {
                text: text.clone(),
                exact: *exact,
            },
            Self::GetLinksOnPage { limit } => PageAction::ReadVisibleLinks { limit: *limit },
            Self::GetSearchResults { limit } => PageAction::GetSearchResults { limit: *limit },
            Self::ClickSearchResultByDomain { domain } => PageAction::ClickResultByDomain {
                domain: domain.clone(),
            },
            Self::GdocsInsertText { text } => PageAction::DocsInsertText { text: text.clone() },
            Self::GdocsBoldSelection => PageAction::DocsBold,
            Self::GsheetsSetCell { cell, value } => PageAction::SheetsSetCell {
                cell: cell.clone(),
                value: value.clone(),
            },
            _ => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;
