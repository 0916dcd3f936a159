use std::path::PathBuf;

use super::launch::chrome_args;
use super::*;
use crate::shell::BrowserShell;

use tabpilot_config::BrowserConfig;

#[test]
fn test_config_default() {
    let config = SurfaceConfig::default();
    assert_eq!(config.debug_port, 9222);
    assert!(!config.headless);
    assert!(config.launch);
    assert_eq!(config.navigation_timeout.as_secs(), 20);
}

#[test]
fn test_config_endpoint() {
    let config = SurfaceConfig::default();
    assert_eq!(config.endpoint(), "http://localhost:9222");
}

#[test]
fn test_config_profile_dir_default() {
    let config = SurfaceConfig::default();
    assert!(config.get_profile_dir().ends_with(".tabpilot/browser-profile"));
}

#[test]
fn test_config_from_browser_config() {
    let browser = BrowserConfig {
        debug_port: 9333,
        headless: true,
        profile_dir: Some("/tmp/tabpilot-profile".to_string()),
        navigation_timeout_secs: 5,
        launch: false,
        ..BrowserConfig::default()
    };
    let config = SurfaceConfig::from(&browser);
    assert_eq!(config.endpoint(), "http://localhost:9333");
    assert_eq!(config.get_profile_dir(), PathBuf::from("/tmp/tabpilot-profile"));
    assert!(!config.launch);
    assert_eq!(config.navigation_timeout.as_secs(), 5);
}

#[test]
fn test_chrome_args() {
    let mut config = SurfaceConfig {
        profile_dir: Some(PathBuf::from("/tmp/p")),
        ..SurfaceConfig::default()
    };
    let args = chrome_args(&config);
    assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
    assert!(args.contains(&"--user-data-dir=/tmp/p".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--headless")));

    config.headless = true;
    assert!(chrome_args(&config).contains(&"--headless=new".to_string()));
}

#[test]
fn test_browser_error_display() {
    let err = BrowserError::ConnectionFailed("timeout".to_string());
    assert_eq!(err.to_string(), "Connection failed: timeout");

    let err = BrowserError::ChromeNotFound;
    assert_eq!(err.to_string(), "Chrome not found. Please install Google Chrome.");

    let err = BrowserError::SurfaceNotFound("tab-7".to_string());
    assert_eq!(err.to_string(), "Surface not found: tab-7");
}

#[test]
fn test_browser_error_from_cdp() {
    let err: BrowserError = crate::cdp::CdpError::SessionClosed.into();
    assert!(matches!(err, BrowserError::NotConnected));

    let err: BrowserError = crate::cdp::CdpError::NavigationFailed("net::ERR_NAME_NOT_RESOLVED".into()).into();
    assert!(matches!(err, BrowserError::NavigationFailed(_)));
}

#[test]
fn test_find_chrome() {
    let _result = find_chrome();
}

#[tokio::test]
async fn test_close_without_connect() {
    let registry = SurfaceRegistry::new(SurfaceConfig::default());
    assert!(registry.close().await.is_ok());
}

#[tokio::test]
async fn test_connect_refused_without_launch() {
    // Nothing listens on port 1.
    let registry = SurfaceRegistry::new(SurfaceConfig {
        debug_port: 1,
        launch: false,
        ..SurfaceConfig::default()
    });
    let err = registry.connect().await.unwrap_err();
    assert!(matches!(err, BrowserError::ConnectionFailed(_)));
    assert!(registry.first_surface().await.is_none());
}
