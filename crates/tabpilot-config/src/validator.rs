//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, PermissionMode, MIN_TRUNCATION_STRING_CHARS};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_provider(config, &mut result);
        Self::validate_retry(config, &mut result);
        Self::validate_session(config, &mut result);
        Self::validate_truncation(config, &mut result);
        Self::validate_loop_detection(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_permissions(config, &mut result);

        Ok(result)
    }

    fn validate_provider(config: &Config, result: &mut ValidationResult) {
        let provider = &config.provider;

        if provider.model.trim().is_empty() {
            result.add_error(ValidationError::new(
                "provider.model",
                "Model identifier cannot be empty",
            ));
        }

        if provider.fallback_models.iter().any(|m| m.trim().is_empty()) {
            result.add_error(ValidationError::new(
                "provider.fallback_models",
                "Fallback model identifiers cannot be empty",
            ));
        }

        match provider.api_key.as_deref() {
            None | Some("") => result.add_warning(ValidationWarning::new(
                "provider.api_key",
                "API key is not set, requests to the backend will be rejected",
            )),
            Some(_) => {}
        }

        if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "provider.base_url",
                "base_url must start with http:// or https://",
            ));
        }

        if !(0.0..=2.0).contains(&provider.temperature) {
            result.add_error(ValidationError::new(
                "provider.temperature",
                "temperature must be between 0.0 and 2.0",
            ));
        }

        if !(0.0..=1.0).contains(&provider.top_p) {
            result.add_error(ValidationError::new(
                "provider.top_p",
                "top_p must be between 0.0 and 1.0",
            ));
        }

        if provider.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "provider.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_retry(config: &Config, result: &mut ValidationResult) {
        if config.retry.max_delay_ms < config.retry.base_delay_ms {
            result.add_warning(ValidationWarning::new(
                "retry.max_delay_ms",
                "max_delay_ms is below base_delay_ms, every retry will use max_delay_ms",
            ));
        }
    }

    fn validate_session(config: &Config, result: &mut ValidationResult) {
        let session = &config.session;

        if session.max_rounds == 0 {
            result.add_error(ValidationError::new(
                "session.max_rounds",
                "max_rounds must be greater than 0",
            ));
        }

        if session.max_rounds > 50 {
            result.add_warning(ValidationWarning::new(
                "session.max_rounds",
                "max_rounds is very high (>50), a stalled model may run for a long time",
            ));
        }

        if session.context_char_budget == 0 {
            result.add_error(ValidationError::new(
                "session.context_char_budget",
                "context_char_budget must be greater than 0",
            ));
        } else if session.context_char_budget < 2000 {
            result.add_warning(ValidationWarning::new(
                "session.context_char_budget",
                "context_char_budget is below 2000 chars, most tool results will force compression",
            ));
        }

        if session.summary_max_chars == 0 {
            result.add_error(ValidationError::new(
                "session.summary_max_chars",
                "summary_max_chars must be greater than 0",
            ));
        }
    }

    fn validate_truncation(config: &Config, result: &mut ValidationResult) {
        let t = &config.truncation;
        for (path, value) in [
            ("truncation.max_string_chars", t.max_string_chars),
            ("truncation.max_array_items", t.max_array_items),
            ("truncation.max_object_keys", t.max_object_keys),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "limit must be greater than 0"));
            }
        }
        if t.max_string_chars > 0 && t.max_string_chars < MIN_TRUNCATION_STRING_CHARS {
            result.add_error(ValidationError::new(
                "truncation.max_string_chars",
                format!(
                    "max_string_chars must be at least {} to fit the truncation marker",
                    MIN_TRUNCATION_STRING_CHARS
                ),
            ));
        }
    }

    fn validate_loop_detection(config: &Config, result: &mut ValidationResult) {
        let loops = &config.loop_detection;

        if loops.default_threshold < 1 {
            result.add_error(ValidationError::new(
                "loop_detection.default_threshold",
                "default_threshold must be at least 1",
            ));
        }

        if loops.workflow_threshold < 1 {
            result.add_error(ValidationError::new(
                "loop_detection.workflow_threshold",
                "workflow_threshold must be at least 1",
            ));
        }

        if loops.workflow_threshold < loops.default_threshold {
            result.add_error(ValidationError::new(
                "loop_detection.workflow_threshold",
                "workflow_threshold cannot be lower than default_threshold",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let browser = &config.browser;

        if browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "debug_port cannot be 0",
            ));
        }

        if browser.page_timeout_secs == 0 || browser.navigation_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "browser",
                "page and navigation timeouts must be greater than 0",
            ));
        }
    }

    fn validate_permissions(config: &Config, result: &mut ValidationResult) {
        let perms = &config.permissions;

        for origin in &perms.origins {
            if perms.denied_origins.contains(origin) {
                result.add_error(ValidationError::new(
                    "permissions",
                    format!("Origin '{}' is both granted and denied", origin),
                ));
            }
        }

        if perms.mode == PermissionMode::Allowlist && perms.origins.is_empty() {
            result.add_warning(ValidationWarning::new(
                "permissions.origins",
                "allowlist mode with no origins will deny every page",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
