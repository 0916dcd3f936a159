//! Tool declaration catalog exposed to the model.

use serde_json::{Map, Value, json};

use tabpilot_protocols::ToolDeclaration;

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn number(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

fn integer(description: &str) -> Value {
    json!({ "type": "integer", "description": description })
}

fn boolean(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

fn one_of(description: &str, values: &[&str]) -> Value {
    json!({ "type": "string", "description": description, "enum": values })
}

fn tool(name: &str, description: &str, properties: Vec<(&str, Value)>, required: &[&str]) -> ToolDeclaration {
    let decl = ToolDeclaration::new(name, description);
    if properties.is_empty() {
        return decl;
    }
    let properties: Map<String, Value> = properties
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    decl.with_parameters(schema)
}

/// The full browser tool catalog, in presentation order.
pub fn browser_tools() -> Vec<ToolDeclaration> {
    vec![
        // Page actions
        tool(
            "scrollTo",
            "Scroll the current page to an absolute vertical offset in pixels.",
            vec![("y", number("Vertical offset in pixels"))],
            &["y"],
        ),
        tool(
            "clickSelector",
            "Click the first element matching a CSS selector.",
            vec![("selector", string("CSS selector"))],
            &["selector"],
        ),
        tool(
            "fillSelector",
            "Set the value of an input, textarea or editable element matching a CSS selector.",
            vec![
                ("selector", string("CSS selector")),
                ("value", string("Value to enter")),
            ],
            &["selector", "value"],
        ),
        tool(
            "insertText",
            "Insert text at the cursor, or into the element matching an optional selector.",
            vec![
                ("text", string("Text to insert")),
                ("selector", string("Optional CSS selector to focus first")),
            ],
            &["text"],
        ),
        tool(
            "focusSelector",
            "Focus the element matching a CSS selector.",
            vec![("selector", string("CSS selector"))],
            &["selector"],
        ),
        tool(
            "selectOption",
            "Choose an option of a <select> element by value or visible label.",
            vec![
                ("selector", string("CSS selector of the select element")),
                ("value", string("Option value or label")),
            ],
            &["selector", "value"],
        ),
        tool(
            "pressKey",
            "Press a key on the focused element, e.g. Enter, Escape, ArrowDown.",
            vec![("key", string("Key name"))],
            &["key"],
        ),
        // Extraction
        tool(
            "extractText",
            "Extract readable text from the current page.",
            vec![
                (
                    "method",
                    one_of(
                        "Extraction method (default text)",
                        &["text", "html", "full", "structured", "clean"],
                    ),
                ),
                ("selector", string("Optional CSS selector to extract from")),
                ("query", string("What you are looking for, used to judge relevance")),
            ],
            &[],
        ),
        tool(
            "getAllContent",
            "Extract as much content as possible, including lazy-loaded, framed and shadow DOM content.",
            vec![("query", string("What you are looking for, used to judge relevance"))],
            &[],
        ),
        tool(
            "autoExtractAfterNavigation",
            "Wait for the page to finish loading and settle, then extract its content.",
            vec![
                ("query", string("What you are looking for, used to judge relevance")),
                ("waitMs", integer("Extra settle time in milliseconds (default 1500)")),
            ],
            &[],
        ),
        // Navigation and discovery
        tool(
            "navigate",
            "Navigate the current tab to a URL and wait for it to load.",
            vec![("url", string("Absolute URL"))],
            &["url"],
        ),
        tool(
            "waitForSelector",
            "Wait until an element matching a CSS selector appears.",
            vec![
                ("selector", string("CSS selector")),
                ("timeoutMs", integer("Maximum wait in milliseconds (default 8000, at most 30000)")),
            ],
            &["selector"],
        ),
        tool(
            "clickLinkByText",
            "Click a visible link by its text.",
            vec![
                ("text", string("Link text")),
                ("exact", boolean("Require an exact text match")),
            ],
            &["text"],
        ),
        tool(
            "getLinksOnPage",
            "List visible links on the current page.",
            vec![("limit", integer("Maximum number of links (default 50)"))],
            &[],
        ),
        tool(
            "getSearchResults",
            "List the results of the search results page currently shown.",
            vec![("limit", integer("Maximum number of results (default 10)"))],
            &[],
        ),
        tool(
            "clickSearchResultByDomain",
            "Open the best search result whose host matches a domain.",
            vec![("domain", string("Domain such as example.com"))],
            &["domain"],
        ),
        // Browser shell
        tool(
            "openNewTab",
            "Open a new tab, optionally at a URL, and make it the current tab.",
            vec![("url", string("Optional URL to open"))],
            &[],
        ),
        tool("closeCurrentTab", "Close the current tab.", vec![], &[]),
        tool(
            "switchToTabByTitle",
            "Make the first tab whose title contains the given text the current tab.",
            vec![("title", string("Part of the tab title"))],
            &["title"],
        ),
        tool(
            "searchWeb",
            "Search the web and show the results page in the current tab.",
            vec![
                ("query", string("Search query")),
                ("engine", one_of("Search engine (default google)", &["google", "bing", "duckduckgo"])),
            ],
            &["query"],
        ),
        tool("listOpenTabs", "List open tabs with their titles and URLs.", vec![], &[]),
        // Documents
        tool(
            "gdocsCreateDocument",
            "Create a new Google Docs document in a new tab.",
            vec![("title", string("Optional document title"))],
            &[],
        ),
        tool(
            "gdocsInsertText",
            "Insert text at the cursor of the open Google Docs document.",
            vec![("text", string("Text to insert"))],
            &["text"],
        ),
        tool(
            "gdocsBoldSelection",
            "Toggle bold on the current selection of the open Google Docs document.",
            vec![],
            &[],
        ),
        tool(
            "gsheetsCreateSpreadsheet",
            "Create a new Google Sheets spreadsheet in a new tab.",
            vec![("title", string("Optional spreadsheet title"))],
            &[],
        ),
        tool(
            "gsheetsSetCell",
            "Set a cell of the open Google Sheets spreadsheet.",
            vec![
                ("cell", string("Cell in A1 notation, e.g. B7")),
                ("value", string("Cell value or formula")),
            ],
            &["cell", "value"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_complete() {
        let tools = browser_tools();
        assert_eq!(tools.len(), 26);
        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 26);
        for name in [
            "scrollTo",
            "clickSelector",
            "fillSelector",
            "insertText",
            "focusSelector",
            "selectOption",
            "pressKey",
            "extractText",
            "getAllContent",
            "autoExtractAfterNavigation",
            "navigate",
            "waitForSelector",
            "clickLinkByText",
            "getLinksOnPage",
            "getSearchResults",
            "clickSearchResultByDomain",
            "openNewTab",
            "closeCurrentTab",
            "switchToTabByTitle",
            "searchWeb",
            "listOpenTabs",
            "gdocsCreateDocument",
            "gdocsInsertText",
            "gdocsBoldSelection",
            "gsheetsCreateSpreadsheet",
            "gsheetsSetCell",
        ] {
            assert!(names.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_required_params_are_declared_properties() {
        for decl in browser_tools() {
            for required in decl.required_params() {
                assert!(
                    decl.parameters["properties"].get(required).is_some(),
                    "{} requires undeclared {}",
                    decl.name,
                    required
                );
            }
        }
    }

    #[test]
    fn test_argument_free_tools_keep_empty_schema() {
        let tools = browser_tools();
        let list = tools.iter().find(|t| t.name == "listOpenTabs").unwrap();
        assert_eq!(list.parameters, json!({ "type": "object", "properties": {} }));
    }
}
