use super::*;
use serde_json::json;

fn provider() -> GeminiProvider {
    GeminiProvider::new("test-key", crate::DEFAULT_BASE_URL, Duration::from_secs(5)).unwrap()
}

#[test]
fn test_provider_creation() {
    assert_eq!(provider().id(), "gemini");
}

#[test]
fn test_convert_messages_roles() {
    let contents = provider().convert_messages(&[
        Message::user("Hello"),
        Message::assistant("Hi there!"),
    ]);
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].role, "user");
    assert_eq!(contents[1].role, "model");
}

#[test]
fn test_history_system_note_becomes_user_text() {
    let contents = provider().convert_messages(&[
        Message::system("[Compressed summary of earlier conversation]\nvisited example.com"),
        Message::user("continue"),
    ]);
    // Both are user-role and get merged into one turn.
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].role, "user");
    assert_eq!(contents[0].parts.len(), 2);
}

#[test]
fn test_tool_round_trip_mapping() {
    let call = ToolCall::new("call-1", "navigate", json!({"url": "https://example.com"}));
    let contents = provider().convert_messages(&[
        Message::user("open example"),
        Message::assistant_with_tool_calls("", vec![call]),
        Message::tool("call-1", "navigate", r#"{"success":true,"url":"https://example.com/"}"#),
    ]);

    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1].role, "model");
    // Empty assistant text is not sent as a part.
    assert_eq!(contents[1].parts.len(), 1);
    assert!(matches!(
        &contents[1].parts[0],
        Part::FunctionCall { function_call } if function_call.name == "navigate"
    ));

    match &contents[2].parts[0] {
        Part::FunctionResponse { function_response } => {
            assert_eq!(function_response.name, "navigate");
            assert_eq!(function_response.response["success"], true);
        }
        other => panic!("unexpected part: {other:?}"),
    }
}

#[test]
fn test_non_object_tool_result_is_wrapped() {
    let contents = provider().convert_messages(&[Message::tool("c", "extractText", "plain text")]);
    match &contents[0].parts[0] {
        Part::FunctionResponse { function_response } => {
            assert_eq!(function_response.response, json!({"result": "plain text"}));
        }
        other => panic!("unexpected part: {other:?}"),
    }
}

#[test]
fn test_consecutive_tool_results_merge() {
    let contents = provider().convert_messages(&[
        Message::tool("a", "listOpenTabs", "{}"),
        Message::tool("b", "extractText", "{}"),
    ]);
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].parts.len(), 2);
}

#[test]
fn test_convert_system_from_request() {
    let request = CompletionRequest::new("m", vec![]).with_system("You drive a browser");
    let system = provider().convert_system(&request).unwrap();
    assert!(matches!(&system.parts[0], Part::Text { text } if text == "You drive a browser"));

    let blank = CompletionRequest::new("m", vec![]).with_system("  ");
    assert!(provider().convert_system(&blank).is_none());
}

#[test]
fn test_convert_tools_skips_empty_schema() {
    let request = CompletionRequest::new("m", vec![]).with_tools(vec![
        ToolDeclaration::new("listOpenTabs", "List tabs"),
        ToolDeclaration::new("navigate", "Go to a URL").with_parameters(json!({
            "type": "object",
            "properties": {"url": {"type": "string"}},
            "required": ["url"]
        })),
    ]);
    let tools = provider().convert_tools(&request).unwrap();
    let decls = &tools[0].function_declarations;
    assert!(decls[0].parameters.is_none());
    assert!(decls[1].parameters.is_some());

    assert!(provider().convert_tools(&CompletionRequest::new("m", vec![])).is_none());
}

#[test]
fn test_convert_response_text() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": "Done."}]}, "finishReason": "STOP"}]
    }))
    .unwrap();
    let converted = provider().convert_response(response, "gemini-2.0-flash").unwrap();
    assert_eq!(converted.text(), "Done.");
    assert_eq!(converted.stop_reason, StopReason::EndTurn);
    assert_eq!(converted.model, "gemini-2.0-flash");
}

#[test]
fn test_convert_response_function_calls() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"functionCall": {"name": "openNewTab", "args": {"url": "https://a.test"}}},
                {"functionCall": {"name": "listOpenTabs", "args": {}}}
            ]},
            "finishReason": "STOP"
        }]
    }))
    .unwrap();
    let converted = provider().convert_response(response, "m").unwrap();
    assert_eq!(converted.stop_reason, StopReason::ToolUse);
    let calls = converted.tool_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].id.starts_with("call_"));
    assert_ne!(calls[0].id, calls[1].id);
    assert_eq!(calls[0].arguments["url"], "https://a.test");
}

#[test]
fn test_convert_response_empty_candidates() {
    let err = provider()
        .convert_response(GenerateContentResponse::default(), "m")
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

#[test]
fn test_convert_response_blocked_prompt() {
    let response: GenerateContentResponse =
        serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
    let err = provider().convert_response(response, "m").unwrap_err();
    assert!(matches!(err, ProviderError::ContentFiltered(_)));
}

#[test]
fn test_convert_response_safety_without_parts() {
    let response: GenerateContentResponse =
        serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
    let err = provider().convert_response(response, "m").unwrap_err();
    assert!(matches!(err, ProviderError::ContentFiltered(_)));
}

#[test]
fn test_convert_response_max_tokens() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
        "candidates": [{"content": {"parts": [{"text": "partial"}]}, "finishReason": "MAX_TOKENS"}],
        "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2048, "totalTokenCount": 2058}
    }))
    .unwrap();
    let converted = provider().convert_response(response, "m").unwrap();
    assert_eq!(converted.stop_reason, StopReason::MaxTokens);
    assert_eq!(converted.usage.total_tokens, 2058);
}

mod http_tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    const PATH: &str = "/models/gemini-2.0-flash:generateContent";

    fn provider_for(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new("test-key", server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("gemini-2.0-flash", vec![Message::user("Hello")])
            .with_system("You drive a browser")
            .with_temperature(0.2)
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        let response_body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello back!"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 3, "totalTokenCount": 6}
        })
        .to_string();

        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .and(matchers::query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(&response_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = provider_for(&mock_server).complete(request()).await.unwrap();
        assert_eq!(response.text(), "Hello back!");
        assert_eq!(response.usage.prompt_tokens, 3);
    }

    #[tokio::test]
    async fn test_complete_sends_system_instruction() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .and(matchers::body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "You drive a browser"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}).to_string(),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = provider_for(&mock_server).complete(request()).await.unwrap();
        assert_eq!(response.text(), "ok");
    }

    #[tokio::test]
    async fn test_complete_string_encoded_args_pass_through() {
        let mock_server = MockServer::start().await;

        let response_body = json!({
            "candidates": [{
                "content": {"parts": [{"functionCall": {"name": "navigate", "args": "{\"url\":\"https://x.test\"}"}}]}
            }]
        })
        .to_string();

        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(&response_body))
            .mount(&mock_server)
            .await;

        let response = provider_for(&mock_server).complete(request()).await.unwrap();
        assert_eq!(response.tool_calls().len(), 1);
        assert!(response.tool_calls()[0].arguments.is_string());
    }

    #[tokio::test]
    async fn test_complete_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#,
            ))
            .mount(&mock_server)
            .await;

        let err = provider_for(&mock_server).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(ref m) if m.contains("API key")));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_complete_rate_limited_reads_retry_after() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string(r#"{"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#),
            )
            .mount(&mock_server)
            .await;

        let err = provider_for(&mock_server).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after_seconds: 7 }));
    }

    #[tokio::test]
    async fn test_complete_server_error_is_transient() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
            .mount(&mock_server)
            .await;

        let err = provider_for(&mock_server).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_complete_unknown_model() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/models/nope:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                r#"{"error": {"code": 404, "message": "models/nope is not found", "status": "NOT_FOUND"}}"#,
            ))
            .mount(&mock_server)
            .await;

        let err = provider_for(&mock_server)
            .complete(request().for_model("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let err = provider_for(&mock_server).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
