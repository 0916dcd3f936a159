//! Integration tests against a real Chrome.
//!
//! These tests launch Chrome and are ignored by default.
//! Run with: cargo test -p tabpilot-tools-browser --test integration_test -- --ignored --nocapture

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};

use tabpilot_protocols::{SurfaceId, ToolExecutor};
use tabpilot_tools_browser::surfaces::find_chrome;
use tabpilot_tools_browser::{
    AutoGrant, BrowserDispatcher, BrowserShell, CdpPageChannel, DispatchSettings,
    ExtractorSettings, SurfaceConfig, SurfaceRegistry,
};

const ARTICLE_PAGE: &str = "data:text/html,<title>Fixture</title><nav><a href='https://example.com/'>Home</a></nav>\
<article><h1>Release notes</h1><p>The borrow checker now accepts more programs that were previously rejected.</p>\
<p>Incremental compilation got faster for large workspaces with many crates.</p></article>\
<input id='q'><a href='https://www.google.com/url?q=https://www.rust-lang.org/'>Rust</a>";

/// Test helper to create a registry with test-specific config.
fn test_config() -> SurfaceConfig {
    SurfaceConfig {
        debug_port: 9333, // Use different port to avoid conflicts
        profile_dir: Some(PathBuf::from("/tmp/tabpilot-test-profile")),
        headless: true,
        launch: true,
        navigation_timeout: Duration::from_secs(20),
    }
}

fn dispatcher(registry: Arc<SurfaceRegistry>) -> BrowserDispatcher {
    BrowserDispatcher::new(
        registry.clone(),
        Arc::new(CdpPageChannel::new(registry)),
        Arc::new(AutoGrant),
        DispatchSettings::default(),
        ExtractorSettings::default(),
    )
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
#[ignore]
async fn test_chrome_detection() {
    let chrome_path = find_chrome();
    assert!(chrome_path.is_some(), "Chrome should be installed on the system");

    let path = chrome_path.unwrap();
    println!("Found Chrome at: {}", path.display());
    assert!(path.exists(), "Chrome path should exist");
}

#[tokio::test]
#[ignore]
async fn test_open_list_close_tabs() {
    let registry = Arc::new(SurfaceRegistry::new(test_config()));

    let surface = registry.open_tab(Some(ARTICLE_PAGE)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let tabs = registry.list_tabs().await.unwrap();
    println!("Open tabs: {:?}", tabs);
    assert!(tabs.iter().any(|t| t.id == surface));

    let status = registry.status(&surface).await.unwrap();
    assert_eq!(status.title, "Fixture");

    registry.close_tab(&surface).await.unwrap();
    let tabs = registry.list_tabs().await.unwrap();
    assert!(!tabs.iter().any(|t| t.id == surface));

    registry.shutdown_chrome().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_fill_and_extract() {
    let registry = Arc::new(SurfaceRegistry::new(test_config()));
    let dispatcher = dispatcher(registry.clone());

    let opened = dispatcher
        .dispatch("openNewTab", &args(json!({ "url": ARTICLE_PAGE })), None)
        .await;
    assert!(opened.result.success, "{:?}", opened.result.error);
    let surface: SurfaceId = opened.surface.unwrap();

    let filled = dispatcher
        .dispatch("fillSelector", &args(json!({ "selector": "#q", "value": "tokio" })), Some(&surface))
        .await;
    assert!(filled.result.success, "{:?}", filled.result.error);

    let extracted = dispatcher
        .dispatch("extractText", &args(json!({ "query": "borrow checker" })), Some(&surface))
        .await;
    println!("Extracted: {:?}", extracted.result);
    assert!(extracted.result.success);
    assert!(extracted.result.get_str("text").unwrap().contains("borrow checker"));

    let missing = dispatcher
        .dispatch("clickSelector", &args(json!({ "selector": "#does-not-exist" })), Some(&surface))
        .await;
    assert!(!missing.result.success);

    registry.shutdown_chrome().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_links_are_unwrapped() {
    let registry = Arc::new(SurfaceRegistry::new(test_config()));
    let dispatcher = dispatcher(registry.clone());

    let opened = dispatcher
        .dispatch("openNewTab", &args(json!({ "url": ARTICLE_PAGE })), None)
        .await;
    let surface = opened.surface.unwrap();

    let links = dispatcher
        .dispatch("getLinksOnPage", &Map::new(), Some(&surface))
        .await;
    assert!(links.result.success);
    let hrefs: Vec<&str> = links.result.get("links").unwrap().as_array().unwrap()
        .iter()
        .filter_map(|l| l["href"].as_str())
        .collect();
    println!("Links: {:?}", hrefs);
    assert!(hrefs.contains(&"https://www.rust-lang.org/"));

    registry.shutdown_chrome().await.unwrap();
}
