use super::*;
use serde_json::json;

use crate::catalog::browser_tools;

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn parse(name: &str, value: Value) -> Result<ToolInvocation, ToolError> {
    ToolInvocation::parse(name, &args(value))
}

#[test]
fn test_parse_fill() {
    assert_eq!(
        parse("fillSelector", json!({ "selector": "#q", "value": "rust", "extra": 1 })).unwrap(),
        ToolInvocation::FillSelector {
            selector: "#q".to_string(),
            value: "rust".to_string(),
        }
    );
}

#[test]
fn test_missing_vs_empty_required() {
    assert_eq!(
        parse("clickSelector", json!({})).unwrap_err(),
        ToolError::MissingArgument {
            tool: "clickSelector".to_string(),
            argument: "selector".to_string(),
        }
    );
    assert_eq!(
        parse("clickSelector", json!({ "selector": null })).unwrap_err(),
        ToolError::MissingArgument {
            tool: "clickSelector".to_string(),
            argument: "selector".to_string(),
        }
    );
    assert!(matches!(
        parse("clickSelector", json!({ "selector": "  " })).unwrap_err(),
        ToolError::InvalidArgument { argument, .. } if argument == "selector"
    ));
}

#[test]
fn test_wrong_types_are_rejected() {
    assert!(matches!(
        parse("clickSelector", json!({ "selector": ["#a"] })),
        Err(ToolError::InvalidArgument { .. })
    ));
    assert!(matches!(
        parse("scrollTo", json!({ "y": "down" })),
        Err(ToolError::InvalidArgument { .. })
    ));
    assert!(matches!(
        parse("clickLinkByText", json!({ "text": "Next", "exact": "maybe" })),
        Err(ToolError::InvalidArgument { .. })
    ));
}

#[test]
fn test_numeric_strings_are_accepted() {
    assert_eq!(
        parse("scrollTo", json!({ "y": "1200" })).unwrap(),
        ToolInvocation::ScrollTo { y: 1200.0 }
    );
    assert_eq!(
        parse("waitForSelector", json!({ "selector": ".x", "timeoutMs": "2500" })).unwrap(),
        ToolInvocation::WaitForSelector {
            selector: ".x".to_string(),
            timeout_ms: 2500,
        }
    );
    assert_eq!(
        parse("fillSelector", json!({ "selector": "#age", "value": 42 })).unwrap(),
        ToolInvocation::FillSelector {
            selector: "#age".to_string(),
            value: "42".to_string(),
        }
    );
}

#[test]
fn test_defaults() {
    assert_eq!(
        parse("waitForSelector", json!({ "selector": ".x" })).unwrap(),
        ToolInvocation::WaitForSelector {
            selector: ".x".to_string(),
            timeout_ms: DEFAULT_WAIT_MS,
        }
    );
    assert_eq!(
        parse("extractText", json!({})).unwrap(),
        ToolInvocation::ExtractText {
            method: ExtractMethod::Text,
            selector: None,
            query: None,
        }
    );
    assert_eq!(
        parse("searchWeb", json!({ "query": "tokio" })).unwrap(),
        ToolInvocation::SearchWeb {
            query: "tokio".to_string(),
            engine: SearchEngine::Google,
        }
    );
    assert_eq!(
        parse("clickLinkByText", json!({ "text": "Docs", "exact": "true" })).unwrap(),
        ToolInvocation::ClickLinkByText {
            text: "Docs".to_string(),
            exact: true,
        }
    );
}

#[test]
fn test_wait_timeout_is_capped() {
    assert_eq!(
        parse("waitForSelector", json!({ "selector": "#x", "timeoutMs": 1e12 })).unwrap(),
        ToolInvocation::WaitForSelector {
            selector: "#x".to_string(),
            timeout_ms: MAX_WAIT_MS,
        }
    );
    assert_eq!(
        parse("waitForSelector", json!({ "selector": "#x", "timeoutMs": 30_000 })).unwrap(),
        ToolInvocation::WaitForSelector {
            selector: "#x".to_string(),
            timeout_ms: 30_000,
        }
    );
}

#[test]
fn test_enums_are_validated() {
    assert!(matches!(
        parse("extractText", json!({ "method": "markdown" })),
        Err(ToolError::InvalidArgument { argument, .. }) if argument == "method"
    ));
    assert!(matches!(
        parse("searchWeb", json!({ "query": "x", "engine": "altavista" })),
        Err(ToolError::InvalidArgument { argument, .. }) if argument == "engine"
    ));
}

#[test]
fn test_navigate_url_normalization() {
    assert_eq!(
        parse("navigate", json!({ "url": "example.com/docs" })).unwrap(),
        ToolInvocation::Navigate {
            url: "https://example.com/docs".to_string(),
        }
    );
    assert_eq!(
        parse("navigate", json!({ "url": " http://localhost:8080/ " })).unwrap(),
        ToolInvocation::Navigate {
            url: "http://localhost:8080/".to_string(),
        }
    );
    assert!(parse("navigate", json!({ "url": "javascript:alert(1)" })).is_err());
}

#[test]
fn test_sheet_cell_notation() {
    assert_eq!(
        parse("gsheetsSetCell", json!({ "cell": "b7", "value": "=SUM(A1:A6)" })).unwrap(),
        ToolInvocation::GsheetsSetCell {
            cell: "B7".to_string(),
            value: "=SUM(A1:A6)".to_string(),
        }
    );
    for bad in ["7B", "A0", "ABCD1", "R1C1"] {
        assert!(parse("gsheetsSetCell", json!({ "cell": bad, "value": "x" })).is_err(), "{}", bad);
    }
}

#[test]
fn test_unknown_tool() {
    assert_eq!(
        parse("deleteEverything", json!({})).unwrap_err(),
        ToolError::UnknownTool("deleteEverything".to_string())
    );
}

#[test]
fn test_scope_and_navigation_flags() {
    let nav = parse("navigate", json!({ "url": "https://example.com" })).unwrap();
    assert_eq!(nav.scope(), ToolScope::Surface);
    assert!(nav.expects_navigation());

    let tabs = parse("listOpenTabs", json!({})).unwrap();
    assert_eq!(tabs.scope(), ToolScope::Shell);
    assert!(!tabs.expects_navigation());
    assert!(tabs.page_action().is_none());

    let click = parse("clickSearchResultByDomain", json!({ "domain": "example.com" })).unwrap();
    assert!(click.expects_navigation());
    assert_eq!(
        click.page_action(),
        Some(PageAction::ClickResultByDomain {
            domain: "example.com".to_string()
        })
    );
}

#[test]
fn test_catalog_and_parser_agree() {
    for decl in browser_tools() {
        // The parser knows every declared tool.
        let mut full = Map::new();
        for (key, schema) in decl.parameters["properties"].as_object().into_iter().flatten() {
            let sample = match (key.as_str(), schema["type"].as_str()) {
                ("cell", _) => json!("A1"),
                ("url", _) => json!("https://example.com"),
                ("method", _) => json!("text"),
                ("engine", _) => json!("bing"),
                (_, Some("number")) | (_, Some("integer")) => json!(10),
                (_, Some("boolean")) => json!(true),
                _ => json!("value"),
            };
            full.insert(key.clone(), sample);
        }
        let parsed = ToolInvocation::parse(&decl.name, &full)
            .unwrap_or_else(|e| panic!("{} rejected a full argument set: {}", decl.name, e));
        assert_eq!(parsed.name(), decl.name);

        // Dropping any required argument is a missing-argument error.
        for required in decl.required_params() {
            let mut partial = full.clone();
            partial.remove(required);
            assert!(
                matches!(
                    ToolInvocation::parse(&decl.name, &partial),
                    Err(ToolError::MissingArgument { .. })
                ),
                "{} accepted a call without {}",
                decl.name,
                required
            );
        }
    }
}
