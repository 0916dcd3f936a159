use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tabpilot_protocols::types::{Message, StopReason, Usage};

/// Provider that answers from a script and records the models it was asked for.
struct ScriptedProvider {
    script: Mutex<VecDeque<Result<&'static str, ProviderError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<&'static str, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.calls.lock().push(request.model.clone());
        let next = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(Err(ProviderError::Network("script exhausted".to_string())));
        next.map(|text| CompletionResponse {
            id: "r".to_string(),
            model: request.model,
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
            metadata: Default::default(),
        })
    }
}

fn server_error() -> ProviderError {
    ProviderError::ApiError {
        status: 500,
        message: "internal".to_string(),
    }
}

fn fast_config(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

fn models() -> Vec<String> {
    vec!["primary".to_string(), "alternate".to_string()]
}

#[test]
fn test_retry_config_from_settings() {
    let config = RetryConfig::from(&RetrySettings::default());
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.base_delay, Duration::from_millis(500));
    assert_eq!(config.max_delay, Duration::from_millis(8000));
    assert!(config.jitter);
}

#[test]
fn test_delay_calculation() {
    let config = RetryConfig {
        base_delay: Duration::from_millis(100),
        jitter: false,
        ..Default::default()
    };

    assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
    assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
}

#[test]
fn test_delay_calculation_with_max() {
    let config = RetryConfig {
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(500),
        jitter: false,
        ..Default::default()
    };

    // 100 * 2^3 = 800, capped at 500
    assert_eq!(config.delay_for_attempt(3), Duration::from_millis(500));
}

#[test]
fn test_delay_calculation_with_jitter() {
    let config = RetryConfig {
        base_delay: Duration::from_millis(100),
        backoff_multiplier: 1.0,
        jitter: true,
        ..Default::default()
    };

    let delay = config.delay_for_attempt(0);
    assert!(delay.as_millis() >= 89 && delay.as_millis() <= 111);
}

#[test]
fn test_rate_limit_delay_respects_retry_after() {
    let config = RetryConfig {
        max_delay: Duration::from_secs(10),
        jitter: false,
        ..Default::default()
    };
    let err = ProviderError::RateLimited {
        retry_after_seconds: 3,
    };
    assert_eq!(config.delay_for_error(&err, 0), Duration::from_secs(3));

    let long = ProviderError::RateLimited {
        retry_after_seconds: 600,
    };
    assert_eq!(config.delay_for_error(&long, 0), Duration::from_secs(10));
}

#[tokio::test]
async fn test_success_on_first_try() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok("hello")]));
    let fallback = BackendFallback::new(provider.clone(), models(), fast_config(2));

    let response = fallback
        .complete(&CompletionRequest::new("ignored", vec![Message::user("hi")]))
        .await
        .unwrap();
    assert_eq!(response.text(), "hello");
    assert_eq!(provider.calls(), vec!["primary"]);
}

#[tokio::test]
async fn test_falls_back_after_two_server_errors() {
    // Preferred backend fails twice with 500, first alternate answers.
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(server_error()),
        Err(server_error()),
        Ok("from alternate"),
    ]));
    let fallback = BackendFallback::new(provider.clone(), models(), fast_config(1));

    let response = fallback
        .complete(&CompletionRequest::new("ignored", vec![]))
        .await
        .unwrap();
    assert_eq!(response.text(), "from alternate");
    assert_eq!(response.model, "alternate");
    assert_eq!(provider.calls(), vec!["primary", "primary", "alternate"]);
}

#[tokio::test]
async fn test_retries_same_backend_before_falling_back() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::Network("reset".to_string())),
        Ok("recovered"),
    ]));
    let fallback = BackendFallback::new(provider.clone(), models(), fast_config(2));

    let response = fallback
        .complete(&CompletionRequest::new("ignored", vec![]))
        .await
        .unwrap();
    assert_eq!(response.text(), "recovered");
    assert_eq!(provider.calls(), vec!["primary", "primary"]);
}

#[tokio::test]
async fn test_non_transient_not_retried() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::AuthenticationFailed("bad key".to_string())),
        Ok("never"),
    ]));
    let fallback = BackendFallback::new(provider.clone(), models(), fast_config(3));

    let err = fallback
        .complete(&CompletionRequest::new("ignored", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Provider(ProviderError::AuthenticationFailed(_))
    ));
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_model_not_found_skips_to_next_backend() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::ModelNotFound("primary".to_string())),
        Ok("alternate answer"),
    ]));
    let fallback = BackendFallback::new(provider.clone(), models(), fast_config(3));

    let response = fallback
        .complete(&CompletionRequest::new("ignored", vec![]))
        .await
        .unwrap();
    assert_eq!(response.text(), "alternate answer");
    assert_eq!(provider.calls(), vec!["primary", "alternate"]);
}

#[tokio::test]
async fn test_all_backends_exhausted() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let fallback = BackendFallback::new(provider.clone(), models(), fast_config(1));

    let err = fallback
        .complete(&CompletionRequest::new("ignored", vec![]))
        .await
        .unwrap_err();
    match err {
        SessionError::BackendsExhausted { attempts, last } => {
            assert_eq!(attempts, 4);
            assert!(matches!(last, ProviderError::Network(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_backend_list() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok("unused")]));
    let fallback = BackendFallback::new(provider.clone(), vec![], fast_config(1));

    let err = fallback
        .complete(&CompletionRequest::new("ignored", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::BackendsExhausted { attempts: 0, .. }));
    assert!(provider.calls().is_empty());
}
