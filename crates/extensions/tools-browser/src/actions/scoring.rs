//! Domain-match scoring of result anchors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::profiles::ScoreWeights;
use super::redirect::unwrap_redirect;

static NAV_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(privacy|terms|cookies?|log ?in|sign ?(in|up)|account|settings|help|feedback|about|contact|careers|advertis\w*|legal|sitemap)\b",
    )
    .expect("valid regex")
});

static NAV_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)/(privacy|terms|cookies?|login|signin|sign-in|signup|account|settings|help|support|feedback|about|contact|careers|legal|policies|sitemap)(/|\.|$|\?)",
    )
    .expect("valid regex")
});

/// Anchor reported by the page agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorCandidate {
    pub index: usize,
    pub href: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub in_nav: bool,
}

/// How a hostname matched the requested domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Substring,
    Subdomain,
    Exact,
}

impl MatchKind {
    pub fn quality(self) -> f64 {
        match self {
            MatchKind::Exact => 3.0,
            MatchKind::Subdomain => 2.0,
            MatchKind::Substring => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Subdomain => "subdomain",
            MatchKind::Substring => "substring",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnchor {
    pub index: usize,
    /// Href as reported, used to find the anchor again.
    pub href: String,
    /// Destination after redirect unwrapping.
    pub target: String,
    pub text: String,
    pub kind: MatchKind,
    pub score: f64,
}

/// Lowercase bare host of a user-supplied domain ("https://www.X.com/y" -> "x.com").
pub fn normalize_domain(input: &str) -> String {
    let mut s = input.trim().to_ascii_lowercase();
    if let Some(idx) = s.find("://") {
        s = s[idx + 3..].to_string();
    }
    let s = s.split(['/', '?', '#']).next().unwrap_or_default();
    let s = s.split(':').next().unwrap_or_default();
    s.strip_prefix("www.").unwrap_or(s).trim_matches('.').to_string()
}

fn host_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

pub fn match_kind(host: &str, domain: &str) -> Option<MatchKind> {
    if domain.is_empty() {
        return None;
    }
    if host == domain {
        Some(MatchKind::Exact)
    } else if host.ends_with(&format!(".{}", domain)) {
        Some(MatchKind::Subdomain)
    } else if host.contains(domain) {
        Some(MatchKind::Substring)
    } else {
        None
    }
}

fn looks_navigational(anchor: &AnchorCandidate, url: &Url) -> bool {
    anchor.in_nav || NAV_TEXT.is_match(&anchor.text) || NAV_PATH.is_match(url.path())
}

fn path_segments(url: &Url) -> usize {
    url.path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).count())
        .unwrap_or(0)
}

/// Score every candidate whose host matches `domain`. Order follows the input.
pub fn score_candidates(
    candidates: &[AnchorCandidate],
    domain: &str,
    weights: &ScoreWeights,
) -> Vec<ScoredAnchor> {
    let domain = normalize_domain(domain);
    let total = candidates.len().max(1) as f64;

    candidates
        .iter()
        .enumerate()
        .filter_map(|(rank, anchor)| {
            let target = unwrap_redirect(&anchor.href);
            let url = Url::parse(&target).ok()?;
            let kind = match_kind(&host_of(&url)?, &domain)?;

            let mut score = kind.quality() * weights.match_weight;
            if anchor.primary {
                score += weights.primary_bonus;
            }
            score += weights.position_bonus * (1.0 - rank as f64 / total);
            score += weights.path_bonus * path_segments(&url).min(weights.path_segment_cap) as f64;
            if looks_navigational(anchor, &url) {
                score -= weights.nav_penalty;
            }

            Some(ScoredAnchor {
                index: anchor.index,
                href: anchor.href.clone(),
                target,
                text: anchor.text.clone(),
                kind,
                score,
            })
        })
        .collect()
}

/// Highest-scoring match; earlier candidates win ties.
pub fn best_match(
    candidates: &[AnchorCandidate],
    domain: &str,
    weights: &ScoreWeights,
) -> Option<ScoredAnchor> {
    score_candidates(candidates, domain, weights)
        .into_iter()
        .fold(None, |best: Option<ScoredAnchor>, next| match best {
            Some(b) if b.score >= next.score => Some(b),
            _ => Some(next),
        })
}

/// Distinct hosts among the candidates, in order, for no-match diagnostics.
pub fn available_domains(candidates: &[AnchorCandidate], limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for anchor in candidates {
        let Some(host) = Url::parse(&unwrap_redirect(&anchor.href))
            .ok()
            .and_then(|u| host_of(&u))
        else {
            continue;
        };
        if !out.contains(&host) {
            out.push(host);
            if out.len() >= limit {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(index: usize, href: &str, text: &str, primary: bool) -> AnchorCandidate {
        AnchorCandidate {
            index,
            href: href.to_string(),
            text: text.to_string(),
            primary,
            in_nav: false,
        }
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("Example.com"), "example.com");
        assert_eq!(normalize_domain("https://www.example.com/path?q=1"), "example.com");
        assert_eq!(normalize_domain("docs.rs:443"), "docs.rs");
        assert_eq!(normalize_domain("  "), "");
    }

    #[test]
    fn test_match_kind() {
        assert_eq!(match_kind("example.com", "example.com"), Some(MatchKind::Exact));
        assert_eq!(match_kind("docs.example.com", "example.com"), Some(MatchKind::Subdomain));
        assert_eq!(match_kind("myexample.com", "example.com"), Some(MatchKind::Substring));
        assert_eq!(match_kind("rust-lang.org", "example.com"), None);
        assert_eq!(match_kind("example.com", ""), None);
    }

    #[test]
    fn test_primary_result_beats_privacy_link() {
        let candidates = vec![
            anchor(0, "https://docs.example.com/page", "Example Site", true),
            anchor(1, "https://example.com/privacy", "Privacy", false),
        ];
        let best = best_match(&candidates, "example.com", &ScoreWeights::default()).unwrap();
        assert_eq!(best.href, "https://docs.example.com/page");
        assert_eq!(best.kind, MatchKind::Subdomain);

        let scored = score_candidates(&candidates, "example.com", &ScoreWeights::default());
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn test_primary_wins_even_when_listed_later() {
        let candidates = vec![
            anchor(0, "https://example.com/privacy", "Privacy", false),
            anchor(1, "https://example.com/terms", "Terms of Service", false),
            anchor(2, "https://docs.example.com/page", "Example Site", true),
        ];
        let best = best_match(&candidates, "example.com", &ScoreWeights::default()).unwrap();
        assert_eq!(best.index, 2);
    }

    #[test]
    fn test_redirects_are_scored_by_destination() {
        let candidates = vec![
            anchor(0, "https://www.google.com/url?q=https://www.rust-lang.org/learn", "Learn Rust", true),
            anchor(1, "https://www.google.com/preferences", "Settings", false),
        ];
        let best = best_match(&candidates, "rust-lang.org", &ScoreWeights::default()).unwrap();
        assert_eq!(best.target, "https://www.rust-lang.org/learn");
        assert_eq!(best.kind, MatchKind::Exact);
        assert!(best.href.starts_with("https://www.google.com/url"));
    }

    #[test]
    fn test_nav_container_is_penalized() {
        let mut nav = anchor(0, "https://example.com/blog/post", "Blog post", false);
        nav.in_nav = true;
        let body = anchor(1, "https://example.com/blog/post", "Blog post", false);
        let scored = score_candidates(&[nav, body], "example.com", &ScoreWeights::default());
        assert!(scored[1].score > scored[0].score);
    }

    #[test]
    fn test_ties_keep_earlier() {
        let weights = ScoreWeights {
            position_bonus: 0.0,
            ..ScoreWeights::default()
        };
        let candidates = vec![
            anchor(4, "https://example.com/a", "A", false),
            anchor(9, "https://example.com/b", "B", false),
        ];
        assert_eq!(best_match(&candidates, "example.com", &weights).unwrap().index, 4);
    }

    #[test]
    fn test_no_match_lists_domains() {
        let candidates = vec![
            anchor(0, "https://www.rust-lang.org/", "Rust", true),
            anchor(1, "https://docs.rs/tokio", "tokio", true),
            anchor(2, "https://rust-lang.org/learn", "Learn", false),
            anchor(3, "javascript:void(0)", "noop", false),
        ];
        assert!(best_match(&candidates, "example.com", &ScoreWeights::default()).is_none());
        assert_eq!(available_domains(&candidates, 10), vec!["rust-lang.org", "docs.rs"]);
        assert_eq!(available_domains(&candidates, 1), vec!["rust-lang.org"]);
    }
}
