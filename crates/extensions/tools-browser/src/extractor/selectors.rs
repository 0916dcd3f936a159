//! Selector tables for the extraction ladder.

/// Likely main-content containers, most specific first.
pub const CONTAINER_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    "#content",
    "#main-content",
    "#main",
    ".main-content",
    ".content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".article-body",
    ".story-body",
    ".markdown-body",
    ".documentation",
    "#bodyContent",
];

/// Block elements collected by broad aggregation.
pub const AGGREGATE_SELECTORS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "blockquote", "pre", "code", "dd", "td",
];

/// Aggregated blocks shorter than this are noise (icons, counters).
pub const AGGREGATE_MIN_BLOCK_CHARS: usize = 20;

/// Application-root markers of client-rendered frameworks.
pub const FRAMEWORK_MARKERS: &[&str] = &[
    "#app",
    "#root",
    "#__next",
    "#__nuxt",
    "#svelte",
    "[data-reactroot]",
    "[data-v-app]",
    "[ng-version]",
    "[data-testid]",
    "[data-test-id]",
    "[data-qa]",
];

/// Boilerplate regions removed by the `clean` method.
pub const CLEAN_DENYLIST: &[&str] = &[
    "script",
    "style",
    "noscript",
    "svg",
    "nav",
    "header",
    "footer",
    "aside",
    "form",
    "iframe",
    "[role=\"navigation\"]",
    "[role=\"banner\"]",
    "[role=\"dialog\"]",
    "[aria-modal=\"true\"]",
    ".ad",
    ".ads",
    ".advert",
    ".advertisement",
    "[id*=\"cookie\"]",
    "[class*=\"cookie\"]",
    "[class*=\"consent\"]",
    "[class*=\"modal\"]",
    "[class*=\"popup\"]",
    "[class*=\"sticky\"]",
    "[class*=\"newsletter\"]",
];

/// Progressively broader selectors the dispatcher tries when an
/// `extractText` result is still short.
pub const ESCALATION_SELECTORS: &[&str] =
    &["main", "article", "[role=\"main\"]", "#content", "body"];
