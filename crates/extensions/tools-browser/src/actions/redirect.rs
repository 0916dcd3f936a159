//! Unwrapping of search engine tracking redirects.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use url::{Url, form_urlencoded};

use super::profiles::{is_bing, is_duckduckgo, is_google, is_yahoo};

/// Return the destination behind a known redirect link, or `href` unchanged.
///
/// Only http(s) destinations are accepted.
pub fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let Ok(url) = Url::parse(&absolute) else {
        return href.to_string();
    };
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = url.path();

    let target = if is_google(&host) && path == "/url" {
        query_param(&url, &["q", "url"])
    } else if is_duckduckgo(&host) && path.starts_with("/l/") {
        query_param(&url, &["uddg"])
    } else if is_bing(&host) && path == "/ck/a" {
        query_param(&url, &["u"]).and_then(|u| decode_bing(&u))
    } else if is_yahoo(&host) {
        yahoo_target(path)
    } else {
        None
    };

    match target {
        Some(t) if is_web_url(&t) => t,
        _ => href.to_string(),
    }
}

fn query_param(url: &Url, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        url.query_pairs()
            .find(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    })
}

/// Bing wraps the destination as `a1` + base64url.
fn decode_bing(value: &str) -> Option<String> {
    let encoded = value.strip_prefix("a1")?.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Yahoo embeds the destination as a `/RU=<percent-encoded>/` path segment.
fn yahoo_target(path: &str) -> Option<String> {
    let start = path.find("/RU=")? + "/RU=".len();
    let rest = &path[start..];
    let encoded = rest.split('/').next()?;
    form_urlencoded::parse(format!("u={}", encoded).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
}

fn is_web_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
