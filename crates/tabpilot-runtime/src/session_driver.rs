//! Model session driver.
//!
//! Owns the conversation and runs one user turn as a loop of model calls
//! and sequential tool execution until the model answers in plain text, the
//! round budget runs out, or a terminal error surfaces.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tabpilot_config::{Config, ConfigHandle};
use tabpilot_protocols::approval::{ApprovalGate, ApprovalRequest};
use tabpilot_protocols::error::SessionError;
use tabpilot_protocols::provider::{CompletionRequest, CompletionResponse, LLMProvider};
use tabpilot_protocols::tool::ToolExecutor;
use tabpilot_protocols::types::{Message, ToolCall};

use crate::arguments::parse_arguments;
use crate::compression::{CompressionConfig, ContextCompressor, LLMSummarizer, Summarizer};
use crate::loop_detector::{call_signature, LoopPolicy, LoopVerdict};
use crate::retry::{BackendFallback, RetryConfig};
use crate::state::{DriverState, SessionState};
use crate::truncate::{truncate_value, TruncationLimits};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a browsing assistant that operates the user's \
web browser through tools. Use the tools to search, open pages, read their content and act on \
them. Prefer extracting page text over guessing. When you have enough information, answer the \
user in plain language without calling more tools.";

const BUDGET_EXHAUSTED_INSTRUCTION: &str = "You have used every available tool round. Do not \
call any more tools. Answer the user now using only the information gathered so far.";

const LOOP_DETECTED_INSTRUCTION: &str = "You are repeating the same tool calls without making \
progress. Stop calling tools and give your best final answer from what you have gathered.";

/// Result of one user turn.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub answer: String,
    /// Tool-executing rounds performed.
    pub rounds: u32,
    pub tool_calls_executed: usize,
    /// Whether the answer came from a forced no-tools call.
    pub forced_final: bool,
    /// Messages added during this turn.
    pub transcript: Vec<Message>,
}

#[derive(Default)]
struct TurnProgress {
    rounds: u32,
    executed: usize,
    forced_final: bool,
    transcript: Vec<Message>,
}

/// Per-turn snapshot of everything derived from configuration.
struct TurnContext {
    config: Arc<Config>,
    backend: Arc<BackendFallback>,
    compressor: ContextCompressor,
    policy: LoopPolicy,
    limits: TruncationLimits,
}

/// Drives the model/tool loop for a single session.
pub struct SessionDriver {
    provider: Arc<dyn LLMProvider>,
    tools: Arc<dyn ToolExecutor>,
    approval: Arc<dyn ApprovalGate>,
    config: ConfigHandle,
    summarizer: Option<Arc<dyn Summarizer>>,
    history: Vec<Message>,
    state: SessionState,
    phase: DriverState,
}

impl SessionDriver {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tools: Arc<dyn ToolExecutor>,
        approval: Arc<dyn ApprovalGate>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            provider,
            tools,
            approval,
            config,
            summarizer: None,
            history: Vec::new(),
            state: SessionState::default(),
            phase: DriverState::Done,
        }
    }

    /// Use a specific summarizer instead of one backed by the provider.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> DriverState {
        self.phase
    }

    /// Forget the conversation. The target surface is kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Run one user turn to completion.
    pub async fn run_turn(&mut self, prompt: &str) -> Result<SessionOutcome, SessionError> {
        let ctx = self.turn_context();
        self.state.reset_for_turn();
        if self.state.current_target_surface.is_none() {
            self.state.current_target_surface = self.tools.initial_surface().await;
        }

        let mut turn = TurnProgress::default();
        self.record(&mut turn, Message::user(prompt));

        match self.drive(&ctx, &mut turn).await {
            Ok(answer) => {
                self.set_phase(DriverState::Done);
                info!(
                    "Turn finished after {} rounds, {} tool calls",
                    turn.rounds, turn.executed
                );
                Ok(SessionOutcome {
                    answer,
                    rounds: turn.rounds,
                    tool_calls_executed: turn.executed,
                    forced_final: turn.forced_final,
                    transcript: turn.transcript,
                })
            }
            Err(e) => {
                self.set_phase(DriverState::Failed);
                warn!("Turn failed after {} rounds: {}", turn.rounds, e);
                Err(e)
            }
        }
    }

    fn turn_context(&self) -> TurnContext {
        let config = self.config.current();
        let backend = Arc::new(BackendFallback::new(
            self.provider.clone(),
            config.provider.backend_chain(),
            RetryConfig::from(&config.retry),
        ));
        let summarizer = self
            .summarizer
            .clone()
            .unwrap_or_else(|| Arc::new(LLMSummarizer::new(backend.clone())));

        TurnContext {
            compressor: ContextCompressor::new(
                summarizer,
                CompressionConfig::from(&config.session),
            ),
            policy: LoopPolicy::from(&config.loop_detection),
            limits: TruncationLimits::from(&config.truncation),
            backend,
            config,
        }
    }

    async fn drive(
        &mut self,
        ctx: &TurnContext,
        turn: &mut TurnProgress,
    ) -> Result<String, SessionError> {
        let max_rounds = ctx.config.session.max_rounds;

        loop {
            if turn.rounds >= max_rounds {
                info!("Round budget of {} exhausted, forcing a final answer", max_rounds);
                return self
                    .force_final(ctx, turn, BUDGET_EXHAUSTED_INSTRUCTION)
                    .await
                    .map_err(|e| SessionError::RoundBudgetExhausted {
                        rounds: turn.rounds,
                        reason: e.to_string(),
                    });
            }

            self.set_phase(DriverState::AwaitingModel);
            let response = self.call_model(ctx, true).await?;
            let calls = normalize_calls(response.tool_calls(), turn.rounds);

            if calls.is_empty() {
                self.set_phase(DriverState::FinalAnswer);
                return self.finish(turn, &response);
            }

            self.set_phase(DriverState::ToolsRequested);
            let repeats = self.state.record_signature(call_signature(&calls));
            if let LoopVerdict::Stalled { repeats, threshold } = ctx.policy.verdict(&calls, repeats) {
                warn!(
                    "Same tool plan repeated {} times (threshold {}), forcing a final answer",
                    repeats, threshold
                );
                return self.force_final(ctx, turn, LOOP_DETECTED_INSTRUCTION).await;
            }

            if !ctx.config.approval.auto_approve && !self.approve(turn, &calls).await {
                return Err(SessionError::Declined);
            }

            self.set_phase(DriverState::ExecutingTools);
            self.record(
                turn,
                Message::assistant_with_tool_calls(response.text(), calls.clone()),
            );
            for call in &calls {
                self.execute(ctx, turn, call).await;
            }
            turn.rounds += 1;
        }
    }

    async fn approve(&mut self, turn: &mut TurnProgress, calls: &[ToolCall]) -> bool {
        self.set_phase(DriverState::ApprovalPending);
        let request = ApprovalRequest::new(format!("approval-{}", Uuid::new_v4()), calls.to_vec());
        self.state.pending_approval_id = Some(request.id.clone());

        let approved = self.approval.request_approval(&request).await;
        self.state.pending_approval_id = None;

        if !approved {
            info!("Approval {} declined", request.id);
            self.record(turn, Message::assistant(SessionError::Declined.user_message()));
        }
        approved
    }

    async fn execute(&mut self, ctx: &TurnContext, turn: &mut TurnProgress, call: &ToolCall) {
        let args = parse_arguments(&call.arguments);
        let started = Instant::now();
        let outcome = self
            .tools
            .dispatch(&call.name, &args, self.state.current_target_surface.as_ref())
            .await;

        if let Some(surface) = outcome.surface {
            debug!("Active surface is now {}", surface);
            self.state.current_target_surface = Some(surface);
        }

        info!(
            "Tool {} finished: success={}, elapsed_ms={}",
            call.name,
            outcome.result.success,
            started.elapsed().as_millis()
        );

        let bounded = truncate_value(&outcome.result.to_value(), &ctx.limits);
        self.record(
            turn,
            Message::tool(call.id.clone(), call.name.clone(), bounded.to_string()),
        );
        turn.executed += 1;
    }

    async fn force_final(
        &mut self,
        ctx: &TurnContext,
        turn: &mut TurnProgress,
        instruction: &str,
    ) -> Result<String, SessionError> {
        turn.forced_final = true;
        self.record(turn, Message::user(instruction));
        self.set_phase(DriverState::AwaitingModel);
        let response = self.call_model(ctx, false).await?;
        self.set_phase(DriverState::FinalAnswer);
        self.finish(turn, &response)
    }

    fn finish(
        &mut self,
        turn: &mut TurnProgress,
        response: &CompletionResponse,
    ) -> Result<String, SessionError> {
        let answer = response.text().trim().to_string();
        if answer.is_empty() {
            return Err(SessionError::EmptyResponse);
        }
        self.record(turn, Message::assistant(answer.clone()));
        Ok(answer)
    }

    async fn call_model(
        &mut self,
        ctx: &TurnContext,
        with_tools: bool,
    ) -> Result<CompletionResponse, SessionError> {
        let compressed = ctx.compressor.compress(std::mem::take(&mut self.history)).await;
        self.history = compressed.messages;

        let provider = &ctx.config.provider;
        let system = ctx
            .config
            .session
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let mut request = CompletionRequest::new(provider.model.clone(), self.history.clone())
            .with_system(system)
            .with_temperature(provider.temperature)
            .with_top_p(provider.top_p)
            .with_max_tokens(provider.max_output_tokens);
        if with_tools {
            request = request.with_tools(self.tools.declarations().to_vec());
        }

        ctx.backend.complete(&request).await
    }

    fn record(&mut self, turn: &mut TurnProgress, message: Message) {
        turn.transcript.push(message.clone());
        self.history.push(message);
    }

    fn set_phase(&mut self, phase: DriverState) {
        if self.phase != phase {
            debug!("Driver state {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

/// Decode argument payloads and make sure every call has an id.
fn normalize_calls(calls: &[ToolCall], round: u32) -> Vec<ToolCall> {
    calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            let id = if call.id.is_empty() {
                format!("call-{}-{}", round, i)
            } else {
                call.id.clone()
            };
            ToolCall::new(
                id,
                call.name.clone(),
                serde_json::Value::Object(parse_arguments(&call.arguments)),
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "session_driver_tests.rs"]
mod tests;
