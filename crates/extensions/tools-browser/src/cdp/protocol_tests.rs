use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 1,
        method: "Page.navigate".to_string(),
        params: Some(serde_json::json!({"url": "https://example.com"})),
        session_id: None,
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("Page.navigate"));
    assert!(json.contains("example.com"));
    assert!(!json.contains("sessionId"));
}

#[test]
fn test_cdp_response_deserialize() {
    let json = r#"{"id": 1, "result": {"frameId": "abc"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, Some(1));
    assert!(resp.result.is_some());
}

#[test]
fn test_cdp_event_deserialize() {
    let json = r#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.5}, "sessionId": "S1"}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert!(resp.id.is_none());
    assert_eq!(resp.method.as_deref(), Some("Page.loadEventFired"));
    assert_eq!(resp.session_id.as_deref(), Some("S1"));
}

#[test]
fn test_target_info_user_page() {
    let json = r#"{
        "targetId": "T1",
        "type": "page",
        "title": "Example",
        "url": "https://example.com/",
        "attached": false
    }"#;
    let info: TargetInfo = serde_json::from_str(json).unwrap();
    assert!(info.is_user_page());

    let devtools = TargetInfo {
        url: "devtools://devtools/bundled/inspector.html".to_string(),
        ..info.clone()
    };
    assert!(!devtools.is_user_page());

    let worker = TargetInfo {
        target_type: "service_worker".to_string(),
        ..info
    };
    assert!(!worker.is_user_page());
}

#[test]
fn test_browser_version_deserialize() {
    let json = r#"{
        "Browser": "Chrome/126.0.0.0",
        "Protocol-Version": "1.3",
        "User-Agent": "Mozilla/5.0",
        "V8-Version": "12.6",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/browser/abc"
    }"#;
    let version: BrowserVersion = serde_json::from_str(json).unwrap();
    assert_eq!(version.browser, "Chrome/126.0.0.0");
    assert!(version.web_socket_debugger_url.starts_with("ws://"));
}

#[test]
fn test_document_state() {
    let state: DocumentState = serde_json::from_value(serde_json::json!({
        "url": "https://example.com/",
        "title": "Example",
        "readyState": "complete"
    }))
    .unwrap();
    assert!(state.is_complete());
    assert!(!DocumentState::default().is_complete());
}
