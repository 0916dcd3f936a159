//! `tabpilot config` and `tabpilot tools` commands.

use tabpilot_config::{ConfigHandle, ConfigValidator, ValidationResult};
use tabpilot_tools_browser::browser_tools;

use crate::app::AppResult;

/// Validate the loaded configuration and print what the validator found.
pub(crate) fn handle_config_check(handle: &ConfigHandle) -> AppResult<()> {
    let source = handle
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    let result = ConfigValidator::validate(&handle.current())?;
    print!("{}", render_report(&source, &result));
    if result.is_valid() {
        Ok(())
    } else {
        Err(format!("{} configuration error(s)", result.errors.len()).into())
    }
}

fn render_report(source: &str, result: &ValidationResult) -> String {
    let mut out = format!("Config: {}\n", source);
    for error in &result.errors {
        out.push_str(&format!("  error   {}: {}\n", error.path, error.message));
    }
    for warning in &result.warnings {
        out.push_str(&format!("  warning {}: {}\n", warning.path, warning.message));
    }
    if result.is_valid() {
        out.push_str("OK\n");
    }
    out
}

/// Print the tool declarations offered to the model.
pub(crate) fn handle_tools() -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(&browser_tools())?);
    Ok(())
}
