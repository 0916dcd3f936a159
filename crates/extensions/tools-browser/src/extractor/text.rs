//! Text post-processing: whitespace normalization, navigation filtering
//! and query relevance.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid regex"));

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{3,}").expect("valid regex"));

static NAV_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(home|about( us)?|contact( us)?|log ?in|log ?out|sign ?in|sign ?up|sign ?out|register|menu|search|skip to (main )?content|privacy( policy)?|terms( of (use|service))?|cookies?( policy| settings)?|help|faq|careers|subscribe|share|next|previous|back to top|accept( all)?|close|©.*)$",
    )
    .expect("valid regex")
});

/// Lines longer than this are content even when they start like a nav label.
const NAV_LINE_MAX_CHARS: usize = 40;

/// Characters of body text sampled for relevance scoring.
pub const RELEVANCE_SAMPLE_CHARS: usize = 2000;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "what", "when", "where", "which", "who",
    "how", "are", "was", "were", "you", "your", "about", "into", "over", "page", "site",
];

/// Collapse 3+ newlines to 2 and 3+ spaces to 1, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    let text = SPACE_RUN.replace_all(&text, " ");
    text.trim().to_string()
}

/// Drop short lines that look like site navigation.
pub fn strip_navigation_lines(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.chars().count() > NAV_LINE_MAX_CHARS || !NAV_LINE.is_match(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Query keywords worth matching: lowercased, 3+ chars, no stopwords.
pub fn keywords(query: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
    {
        if !out.contains(&word) {
            out.push(word);
        }
    }
    out
}

/// Fraction of query keywords present in the title or the head of the body.
/// A query without usable keywords scores 1.0.
pub fn relevance_score(query: Option<&str>, title: &str, text: &str) -> f64 {
    let words = match query {
        Some(q) => keywords(q),
        None => return 1.0,
    };
    if words.is_empty() {
        return 1.0;
    }

    let head: String = text.chars().take(RELEVANCE_SAMPLE_CHARS).collect();
    let sample = format!("{} {}", title, head).to_lowercase();
    let hits = words.iter().filter(|w| sample.contains(w.as_str())).count();
    hits as f64 / words.len() as f64
}
