//! Backoff retry and backend fallback for model calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use tabpilot_config::RetrySettings;
use tabpilot_protocols::error::{ProviderError, SessionError};
use tabpilot_protocols::provider::{CompletionRequest, CompletionResponse, LLMProvider};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts per backend.
    pub max_retries: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// Add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_multiplier: 2.0,
            jitter: settings.jitter,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay =
            self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay.as_millis() as f64);

        let delay_ms = if self.jitter {
            let jitter = rand_jitter(delay * 0.1);
            (delay + jitter).max(0.0) as u64
        } else {
            delay as u64
        };

        Duration::from_millis(delay_ms)
    }

    fn delay_for_error(&self, error: &ProviderError, attempt: u32) -> Duration {
        match error {
            ProviderError::RateLimited {
                retry_after_seconds,
            } if *retry_after_seconds > 0 => {
                Duration::from_secs(*retry_after_seconds).min(self.max_delay)
            }
            _ => self.delay_for_attempt(attempt),
        }
    }
}

/// Simple jitter using system time.
fn rand_jitter(max: f64) -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as f64 / u32::MAX as f64) * max * 2.0 - max
}

/// Calls a provider against an ordered list of backend identifiers.
///
/// Each backend is retried with backoff on transient failures. When its
/// retries run out the next backend is tried. Non-transient failures stop
/// the walk immediately.
pub struct BackendFallback {
    provider: Arc<dyn LLMProvider>,
    models: Vec<String>,
    config: RetryConfig,
}

impl BackendFallback {
    /// `models` is the preferred backend followed by alternates.
    pub fn new(provider: Arc<dyn LLMProvider>, models: Vec<String>, config: RetryConfig) -> Self {
        Self {
            provider,
            models,
            config,
        }
    }

    /// Backend identifiers in the order they are tried.
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Complete the request, walking the fallback list as needed.
    ///
    /// The request's own `model` field is ignored.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, SessionError> {
        let mut attempts = 0u32;
        let mut last_error = None;

        for (index, model) in self.models.iter().enumerate() {
            if index > 0 {
                info!("Falling back to backend {}", model);
            }

            for attempt in 0..=self.config.max_retries {
                attempts += 1;
                debug!(
                    "Model call: model={}, messages={}, tools={}",
                    model,
                    request.messages.len(),
                    request.tools.len()
                );

                match self.provider.complete(request.for_model(model.as_str())).await {
                    Ok(response) => return Ok(response),
                    Err(ProviderError::ModelNotFound(message)) => {
                        warn!("Backend {} unavailable: {}", model, message);
                        last_error = Some(ProviderError::ModelNotFound(message));
                        break;
                    }
                    Err(e) if !e.is_transient() => {
                        warn!("Backend {} failed with non-transient error: {}", model, e);
                        return Err(SessionError::Provider(e));
                    }
                    Err(e) => {
                        if attempt < self.config.max_retries {
                            let delay = self.config.delay_for_error(&e, attempt);
                            warn!(
                                "Backend {} error (attempt {}/{}): {}, retrying in {:?}",
                                model,
                                attempt + 1,
                                self.config.max_retries + 1,
                                e,
                                delay
                            );
                            sleep(delay).await;
                        } else {
                            warn!("Backend {} exhausted its retries: {}", model, e);
                        }
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(SessionError::BackendsExhausted {
            attempts,
            last: last_error
                .unwrap_or_else(|| ProviderError::NotFound("no backend configured".to_string())),
        })
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
