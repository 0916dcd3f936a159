//! Site profiles for search result pages.
//!
//! Profiles are checked in order and the first whose host predicate matches
//! wins. The generic profile at the end matches everything.

use url::Url;

/// CSS selectors describing one result entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultSelectors {
    /// Result container. Empty for profiles without structured results.
    pub container: &'static str,
    pub title: &'static str,
    /// Link inside the container; `None` means the anchor around `title`.
    pub link: Option<&'static str>,
    pub snippet: Option<&'static str>,
}

/// Weights used by domain-match scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Multiplier for match quality (exact 3, subdomain 2, substring 1).
    pub match_weight: f64,
    pub primary_bonus: f64,
    /// Bonus for the first candidate, decaying linearly to 0 for the last.
    pub position_bonus: f64,
    /// Bonus per non-empty path segment.
    pub path_bonus: f64,
    pub path_segment_cap: usize,
    pub nav_penalty: f64,
}

const STANDARD_WEIGHTS: ScoreWeights = ScoreWeights {
    match_weight: 2.0,
    primary_bonus: 10.0,
    position_bonus: 3.0,
    path_bonus: 1.0,
    path_segment_cap: 3,
    nav_penalty: 8.0,
};

impl Default for ScoreWeights {
    fn default() -> Self {
        STANDARD_WEIGHTS
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    pub name: &'static str,
    matches: fn(&str) -> bool,
    pub results: ResultSelectors,
    /// Extra selector marking primary result anchors.
    pub primary_anchor: Option<&'static str>,
    pub weights: ScoreWeights,
}

impl SiteProfile {
    pub fn matches_host(&self, host: &str) -> bool {
        (self.matches)(host)
    }

    pub fn has_structured_results(&self) -> bool {
        !self.results.container.is_empty()
    }

    pub fn is_generic(&self) -> bool {
        self.name == GENERIC
    }
}

const GENERIC: &str = "generic";

fn has_label(host: &str, label: &str) -> bool {
    host.split('.').any(|l| l == label)
}

fn is_domain(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

pub(crate) fn is_google(host: &str) -> bool {
    has_label(host, "google")
}

pub(crate) fn is_bing(host: &str) -> bool {
    is_domain(host, "bing.com")
}

pub(crate) fn is_duckduckgo(host: &str) -> bool {
    is_domain(host, "duckduckgo.com")
}

pub(crate) fn is_yahoo(host: &str) -> bool {
    has_label(host, "yahoo")
}

pub static PROFILES: &[SiteProfile] = &[
    SiteProfile {
        name: "google",
        matches: is_google,
        results: ResultSelectors {
            container: "div.g, div.MjjYud",
            title: "h3",
            link: None,
            snippet: Some("div.VwiC3b, div[data-sncf], span.aCOpRe"),
        },
        primary_anchor: Some("a[jsname][data-ved], div.yuRUbf a"),
        weights: STANDARD_WEIGHTS,
    },
    SiteProfile {
        name: "bing",
        matches: is_bing,
        results: ResultSelectors {
            container: "li.b_algo",
            title: "h2",
            link: Some("h2 a"),
            snippet: Some(".b_caption p, p.b_lineclamp2, p.b_lineclamp3"),
        },
        primary_anchor: Some("li.b_algo h2 a"),
        weights: STANDARD_WEIGHTS,
    },
    SiteProfile {
        name: "duckduckgo",
        matches: is_duckduckgo,
        results: ResultSelectors {
            container: "article[data-testid=\"result\"], div.result",
            title: "h2",
            link: Some("a[data-testid=\"result-title-a\"], a.result__a"),
            snippet: Some("[data-result=\"snippet\"], .result__snippet"),
        },
        primary_anchor: Some("a[data-testid=\"result-title-a\"], a.result__a"),
        weights: STANDARD_WEIGHTS,
    },
    SiteProfile {
        name: "yahoo",
        matches: is_yahoo,
        results: ResultSelectors {
            container: "div.algo",
            title: "h3",
            link: Some("h3 a"),
            snippet: Some(".compText p"),
        },
        primary_anchor: Some("div.algo h3 a"),
        weights: ScoreWeights {
            primary_bonus: 9.0,
            ..STANDARD_WEIGHTS
        },
    },
    SiteProfile {
        name: GENERIC,
        matches: |_| true,
        results: ResultSelectors {
            container: "",
            title: "",
            link: None,
            snippet: None,
        },
        primary_anchor: None,
        weights: ScoreWeights {
            primary_bonus: 6.0,
            ..STANDARD_WEIGHTS
        },
    },
];

/// Profile for a page URL. Unparseable URLs get the generic profile.
pub fn profile_for(page_url: &str) -> &'static SiteProfile {
    let host = Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default();
    PROFILES
        .iter()
        .find(|p| p.matches_host(&host))
        .unwrap_or(&PROFILES[PROFILES.len() - 1])
}
