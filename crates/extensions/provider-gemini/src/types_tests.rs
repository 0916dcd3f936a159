use super::*;
use serde_json::json;

#[test]
fn test_part_text() {
    let part = Part::Text {
        text: "Hello".to_string(),
    };
    assert_eq!(serde_json::to_value(&part).unwrap(), json!({"text": "Hello"}));
}

#[test]
fn test_part_function_call_uses_camel_case() {
    let part = Part::FunctionCall {
        function_call: FunctionCall {
            name: "navigate".to_string(),
            args: json!({"url": "https://example.com"}),
        },
    };
    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(json["functionCall"]["name"], "navigate");
    assert_eq!(json["functionCall"]["args"]["url"], "https://example.com");
}

#[test]
fn test_part_function_response() {
    let part = Part::FunctionResponse {
        function_response: FunctionResponse {
            name: "extractText".to_string(),
            response: json!({"success": true}),
        },
    };
    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(json["functionResponse"]["name"], "extractText");
    assert_eq!(json["functionResponse"]["response"]["success"], true);
}

#[test]
fn test_parse_function_call_part() {
    let part: Part =
        serde_json::from_value(json!({"functionCall": {"name": "scrollTo", "args": {"y": 400}}}))
            .unwrap();
    match part {
        Part::FunctionCall { function_call } => {
            assert_eq!(function_call.name, "scrollTo");
            assert_eq!(function_call.args["y"], 400);
        }
        other => panic!("unexpected part: {other:?}"),
    }
}

#[test]
fn test_parse_function_call_without_args() {
    let part: Part =
        serde_json::from_value(json!({"functionCall": {"name": "listOpenTabs"}})).unwrap();
    assert!(matches!(part, Part::FunctionCall { function_call } if function_call.args.is_null()));
}

#[test]
fn test_generation_config_default() {
    let config = GenerationConfig::default();
    assert_eq!(serde_json::to_string(&config).unwrap(), "{}");
}

#[test]
fn test_generation_config_with_values() {
    let config = GenerationConfig {
        temperature: Some(0.2),
        top_p: Some(0.95),
        max_output_tokens: Some(2048),
        stop_sequences: vec![],
    };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["topP"], json!(0.95f32));
    assert_eq!(json["maxOutputTokens"], 2048);
    assert!(json.get("stopSequences").is_none());
}

#[test]
fn test_request_serialization() {
    let request = GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![Part::Text {
                text: "hi".to_string(),
            }],
        }],
        system_instruction: None,
        generation_config: None,
        tools: Some(vec![GeminiTool {
            function_declarations: vec![FunctionDeclaration {
                name: "listOpenTabs".to_string(),
                description: "List tabs".to_string(),
                parameters: None,
            }],
        }]),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("systemInstruction").is_none());
    assert_eq!(json["tools"][0]["functionDeclarations"][0]["name"], "listOpenTabs");
    assert!(json["tools"][0]["functionDeclarations"][0].get("parameters").is_none());
}

#[test]
fn test_response_deserialization() {
    let body = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Hello"}]},
            "finishReason": "STOP",
            "safetyRatings": []
        }],
        "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 1, "totalTokenCount": 5}
    });
    let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.candidates.len(), 1);
    assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("STOP"));
    assert_eq!(response.usage_metadata.unwrap().total_token_count, 5);
}

#[test]
fn test_blocked_candidate_without_content() {
    let body = json!({"candidates": [{"finishReason": "SAFETY"}]});
    let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
    assert!(response.candidates[0].content.parts.is_empty());
}

#[test]
fn test_error_deserialization() {
    let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
    let error: GeminiError = serde_json::from_str(body).unwrap();
    assert_eq!(error.error.code, 400);
    assert!(error.error.message.contains("API key"));
}
