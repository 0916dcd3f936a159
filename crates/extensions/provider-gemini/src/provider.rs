//! Gemini LLM provider implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use tabpilot_protocols::error::ProviderError;
use tabpilot_protocols::provider::{CompletionRequest, CompletionResponse, LLMProvider};
use tabpilot_protocols::tool::ToolDeclaration;
use tabpilot_protocols::types::{Message, MessageRole, StopReason, ToolCall, Usage};

use crate::client::GeminiClient;
use crate::types::*;

/// Gemini LLM provider.
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: GeminiClient::new(api_key, base_url, timeout)?,
        })
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<Content> {
        let mut contents: Vec<Content> = Vec::new();

        for msg in messages {
            let (role, parts) = match msg.role {
                // Only one system instruction exists per request; in-history
                // system notes (summaries) travel as user text.
                MessageRole::System | MessageRole::User => {
                    ("user", text_parts(&msg.content))
                }
                MessageRole::Tool => ("user", vec![function_response(msg)]),
                MessageRole::Assistant => {
                    let mut parts = text_parts(&msg.content);
                    parts.extend(msg.tool_calls.iter().map(|tc| Part::FunctionCall {
                        function_call: FunctionCall {
                            name: tc.name.clone(),
                            args: tc.arguments.clone(),
                        },
                    }));
                    ("model", parts)
                }
            };

            if parts.is_empty() {
                continue;
            }

            // The API wants alternating turns.
            match contents.last_mut() {
                Some(last) if last.role == role => last.parts.extend(parts),
                _ => contents.push(Content {
                    role: role.to_string(),
                    parts,
                }),
            }
        }

        contents
    }

    fn convert_system(&self, request: &CompletionRequest) -> Option<Content> {
        request
            .system
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|system| Content {
                role: "user".to_string(),
                parts: vec![Part::Text {
                    text: system.to_string(),
                }],
            })
    }

    fn convert_tools(&self, request: &CompletionRequest) -> Option<Vec<GeminiTool>> {
        if request.tools.is_empty() {
            return None;
        }

        Some(vec![GeminiTool {
            function_declarations: request.tools.iter().map(convert_declaration).collect(),
        }])
    }

    fn convert_response(
        &self,
        response: GenerateContentResponse,
        model: &str,
    ) -> Result<CompletionResponse, ProviderError> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => ProviderError::ContentFiltered(reason),
                None => ProviderError::InvalidResponse("response has no candidates".to_string()),
            });
        };

        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.parts {
            match part {
                Part::Text { text } => text_parts.push(text),
                Part::FunctionCall { function_call } => {
                    tool_calls.push(ToolCall::new(
                        format!("call_{}", uuid::Uuid::new_v4()),
                        function_call.name,
                        function_call.args,
                    ));
                }
                Part::FunctionResponse { .. } => {}
            }
        }

        let finish_reason = candidate.finish_reason.as_deref();
        if finish_reason == Some("SAFETY") && text_parts.is_empty() && tool_calls.is_empty() {
            return Err(ProviderError::ContentFiltered(
                "candidate blocked by safety filters".to_string(),
            ));
        }

        let stop_reason = if !tool_calls.is_empty() {
            StopReason::ToolUse
        } else {
            match finish_reason {
                Some("MAX_TOKENS") => StopReason::MaxTokens,
                Some("STOP_SEQUENCE") => StopReason::StopSequence,
                Some("SAFETY") => StopReason::Safety,
                _ => StopReason::EndTurn,
            }
        };

        if stop_reason == StopReason::MaxTokens {
            warn!("Gemini response truncated at max output tokens: model={}", model);
        }

        let message = Message::assistant_with_tool_calls(text_parts.join(""), tool_calls);

        let usage = response
            .usage_metadata
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: format!("gemini-{}", uuid::Uuid::new_v4()),
            model: model.to_string(),
            message,
            stop_reason,
            usage,
            metadata: HashMap::new(),
        })
    }
}

fn text_parts(content: &str) -> Vec<Part> {
    if content.trim().is_empty() {
        Vec::new()
    } else {
        vec![Part::Text {
            text: content.to_string(),
        }]
    }
}

/// Tool messages carry a JSON-encoded result. Objects go through as-is,
/// anything else is wrapped.
fn function_response(msg: &Message) -> Part {
    let response = match serde_json::from_str::<Value>(&msg.content) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => json!({ "result": other }),
        Err(_) => json!({ "result": msg.content }),
    };

    Part::FunctionResponse {
        function_response: FunctionResponse {
            name: msg.name.clone().unwrap_or_default(),
            response,
        },
    }
}

fn convert_declaration(tool: &ToolDeclaration) -> FunctionDeclaration {
    let has_properties = tool
        .parameters
        .get("properties")
        .and_then(|p| p.as_object())
        .is_some_and(|p| !p.is_empty());

    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: has_properties.then(|| tool.parameters.clone()),
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        debug!(
            "Gemini complete: model={}, messages={}, tools={}",
            request.model,
            request.messages.len(),
            request.tools.len()
        );

        let gemini_request = GenerateContentRequest {
            contents: self.convert_messages(&request.messages),
            system_instruction: self.convert_system(&request),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                max_output_tokens: request.max_tokens,
                stop_sequences: request.stop.clone(),
            }),
            tools: self.convert_tools(&request),
        };

        let response = self.client.generate_content(&request.model, &gemini_request).await?;
        self.convert_response(response, &request.model)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
