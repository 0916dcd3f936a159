//! Page Extractor: turns a live page into text through a ladder of
//! progressively more aggressive strategies.
//!
//! Each rung only runs while the best text so far is shorter than the
//! requested minimum, and a rung's output only replaces the best when it is
//! strictly longer. Extraction never fails: a page that yields nothing gives
//! an empty result.

mod selectors;
mod text;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, trace};

use tabpilot_config::BrowserConfig;
use tabpilot_protocols::SurfaceId;

use crate::channel::{PageChannel, PageRequest};

pub use selectors::{
    AGGREGATE_SELECTORS, CLEAN_DENYLIST, CONTAINER_SELECTORS, ESCALATION_SELECTORS,
    FRAMEWORK_MARKERS,
};
pub use text::{keywords, normalize_whitespace, relevance_score, strip_navigation_lines};

/// Direct extraction method requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMethod {
    #[default]
    Text,
    Html,
    Full,
    Structured,
    Clean,
}

impl ExtractMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "html" => Some(Self::Html),
            "full" => Some(Self::Full),
            "structured" => Some(Self::Structured),
            "clean" => Some(Self::Clean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Full => "full",
            Self::Structured => "structured",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for ExtractMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs for one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub method: ExtractMethod,
    pub selector: Option<String>,
    /// Used only for the relevance score.
    pub query: Option<String>,
    /// Ladder rungs run while the best text is shorter than this.
    pub min_chars: usize,
    /// Enable the lazy-load scroll rung.
    pub scroll: bool,
    /// Enable the frames and shadow roots rung.
    pub frames: bool,
}

impl ExtractOptions {
    pub fn new(method: ExtractMethod, min_chars: usize) -> Self {
        Self {
            method,
            selector: None,
            query: None,
            min_chars,
            scroll: false,
            frames: false,
        }
    }

    /// Every rung enabled.
    pub fn full_ladder(min_chars: usize) -> Self {
        Self {
            scroll: true,
            frames: true,
            ..Self::new(ExtractMethod::Text, min_chars)
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.trim().is_empty());
        self
    }
}

/// Best-effort extraction outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub text: String,
    pub method_used: String,
    pub quality_score: f64,
}

/// Below this many characters a zero relevance score means the surface is
/// probably showing the wrong page.
pub const WRONG_PAGE_MAX_CHARS: usize = 300;

impl ExtractionResult {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            method_used: "none".to_string(),
            quality_score: 0.0,
        }
    }

    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Heuristic only.
    pub fn looks_like_wrong_page(&self) -> bool {
        self.quality_score == 0.0 && self.chars() < WRONG_PAGE_MAX_CHARS
    }
}

/// Extractor tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorSettings {
    pub request_timeout: Duration,
    pub scroll_passes: u32,
    pub scroll_settle: Duration,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            scroll_passes: 4,
            scroll_settle: Duration::from_millis(600),
        }
    }
}

impl From<&BrowserConfig> for ExtractorSettings {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.page_timeout_secs.max(1)),
            ..Self::default()
        }
    }
}

/// Running best candidate of the ladder.
#[derive(Debug, Default)]
struct Best {
    text: String,
    chars: usize,
    method: String,
}

impl Best {
    /// Adopt `candidate` when strictly longer after normalization.
    fn offer(&mut self, candidate: &str, method: impl Into<String>) -> bool {
        let normalized = normalize_whitespace(candidate);
        let chars = normalized.chars().count();
        if chars <= self.chars {
            return false;
        }
        let method = method.into();
        debug!(method = %method, chars, previous = self.chars, "Extraction strategy adopted");
        self.text = normalized;
        self.chars = chars;
        self.method = method;
        true
    }
}

pub struct Extractor {
    channel: Arc<dyn PageChannel>,
    settings: ExtractorSettings,
}

impl Extractor {
    pub fn new(channel: Arc<dyn PageChannel>, settings: ExtractorSettings) -> Self {
        Self { channel, settings }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Run the ladder against `surface`.
    pub async fn extract(&self, surface: &SurfaceId, options: &ExtractOptions) -> ExtractionResult {
        let mut best = Best::default();
        let min = options.min_chars;

        if let Some(text) = self.direct(surface, options.method, options.selector.as_deref()).await {
            let label = match &options.selector {
                Some(sel) => format!("direct:{}:{}", options.method, sel),
                None => format!("direct:{}", options.method),
            };
            best.offer(&text, label);
        }

        // Markup is not comparable with the text rungs.
        if options.method != ExtractMethod::Html {
            if best.chars < min {
                self.containers(surface, &mut best).await;
            }
            if best.chars < min {
                self.aggregate(surface, &mut best, "aggregate").await;
            }
            if best.chars < min && options.scroll {
                self.scroll_rescue(surface, &mut best).await;
            }
            if best.chars < min && options.frames {
                self.frames(surface, &mut best).await;
            }
            if best.chars < min {
                self.markers(surface, &mut best).await;
            }
            if best.chars < min {
                self.body(surface, &mut best).await;
            }
        }

        let title = match &options.query {
            Some(_) => self.title(surface).await,
            None => String::new(),
        };
        let quality_score = relevance_score(options.query.as_deref(), &title, &best.text);

        if best.method.is_empty() {
            return ExtractionResult {
                quality_score,
                ..ExtractionResult::empty()
            };
        }
        ExtractionResult {
            text: best.text,
            method_used: best.method,
            quality_score,
        }
    }

    async fn ask(&self, surface: &SurfaceId, op: &str, args: Value) -> Option<Value> {
        match self
            .channel
            .request(surface, PageRequest::new(op, args), self.settings.request_timeout)
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                trace!(op, error = %e, "Extraction probe failed");
                None
            }
        }
    }

    async fn direct(
        &self,
        surface: &SurfaceId,
        method: ExtractMethod,
        selector: Option<&str>,
    ) -> Option<String> {
        let args = json!({
            "method": method.as_str(),
            "selector": selector,
            "denylist": CLEAN_DENYLIST,
        });
        let value = self.ask(surface, "extract.direct", args).await?;
        text_field(&value)
    }

    async fn containers(&self, surface: &SurfaceId, best: &mut Best) {
        let Some(value) = self
            .ask(surface, "extract.containers", json!({ "selectors": CONTAINER_SELECTORS }))
            .await
        else {
            return;
        };
        for entry in value.as_array().into_iter().flatten() {
            if !entry.get("visible").and_then(Value::as_bool).unwrap_or(false) {
                continue;
            }
            let Some(text) = text_field(entry) else { continue };
            let selector = entry.get("selector").and_then(Value::as_str).unwrap_or("?");
            if best.offer(&text, format!("container:{}", selector)) {
                break;
            }
        }
    }

    async fn aggregate(&self, surface: &SurfaceId, best: &mut Best, label: &str) {
        let args = json!({
            "selectors": AGGREGATE_SELECTORS,
            "minLength": selectors::AGGREGATE_MIN_BLOCK_CHARS,
        });
        let Some(value) = self.ask(surface, "extract.aggregate", args).await else {
            return;
        };
        let blocks = value
            .get("blocks")
            .and_then(Value::as_array)
            .map(|b| b.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        let joined = join_distinct(blocks);
        if !joined.is_empty() {
            best.offer(&joined, label);
        }
    }

    async fn scroll_rescue(&self, surface: &SurfaceId, best: &mut Best) {
        let passes = self.settings.scroll_passes.max(1);
        for pass in 0..passes {
            let step = self
                .ask(surface, "extract.scrollStep", json!({ "pass": pass, "passes": passes }))
                .await;
            tokio::time::sleep(self.settings.scroll_settle).await;
            let at_bottom = step
                .as_ref()
                .and_then(|s| s.get("atBottom"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if step.is_none() || at_bottom {
                break;
            }
        }

        if let Some(text) = self.direct(surface, ExtractMethod::Text, None).await {
            best.offer(&text, "scroll:text");
        }
        self.aggregate(surface, best, "scroll:aggregate").await;

        self.ask(surface, "extract.scrollStep", json!({ "reset": true })).await;
    }

    async fn frames(&self, surface: &SurfaceId, best: &mut Best) {
        let Some(value) = self.ask(surface, "extract.frames", json!({})).await else {
            return;
        };
        let sources = value
            .get("sources")
            .and_then(Value::as_array)
            .map(|s| s.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        let joined = join_distinct(sources);
        if !joined.is_empty() {
            best.offer(&joined, "frames");
        }
    }

    async fn markers(&self, surface: &SurfaceId, best: &mut Best) {
        let Some(value) = self
            .ask(surface, "extract.markers", json!({ "selectors": FRAMEWORK_MARKERS }))
            .await
        else {
            return;
        };
        let longest = value
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|entry| {
                let text = text_field(entry)?;
                let selector = entry.get("selector").and_then(Value::as_str).unwrap_or("?");
                Some((selector.to_string(), text))
            })
            .max_by_key(|(_, text)| text.chars().count());
        if let Some((selector, text)) = longest {
            best.offer(&text, format!("marker:{}", selector));
        }
    }

    async fn body(&self, surface: &SurfaceId, best: &mut Best) {
        let Some(value) = self.ask(surface, "extract.body", json!({})).await else {
            return;
        };
        if let Some(text) = text_field(&value) {
            best.offer(&strip_navigation_lines(&text), "body");
        }
    }

    async fn title(&self, surface: &SurfaceId) -> String {
        self.ask(surface, "page.info", json!({}))
            .await
            .and_then(|v| v.get("title").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default()
    }
}

fn text_field(value: &Value) -> Option<String> {
    value
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}

/// Join non-empty pieces with blank lines, skipping exact repeats.
fn join_distinct<'a>(pieces: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && seen.insert(*p))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
