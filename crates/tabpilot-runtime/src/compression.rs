//! Context budget compression.
//!
//! When carried conversation content exceeds the character budget, the
//! oldest messages are folded into one labeled bullet digest produced by a
//! single extra model call. The most recent messages stay verbatim. If no
//! split fits the budget, or the digest call fails, messages are dropped from
//! the oldest end instead.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use tabpilot_config::{SessionConfig, MIN_TRUNCATION_STRING_CHARS};
use tabpilot_protocols::error::SessionError;
use tabpilot_protocols::provider::CompletionRequest;
use tabpilot_protocols::types::{Message, MessageRole};

use crate::retry::BackendFallback;
use crate::truncate::truncate_str;

/// Label that opens every compressed digest.
pub const SUMMARY_LABEL: &str = "[Compressed summary of earlier conversation]";

const SUMMARY_SYSTEM_PROMPT: &str = "You compress conversation history for a browsing assistant. \
Write a short bullet list (one fact per line, starting with '- ') of what the user asked, \
which pages were visited, what was found, and what is still open. Do not invent details.";

/// Budget settings for compression.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Character budget for carried content.
    pub budget: usize,
    /// Messages kept verbatim on the first attempt.
    pub keep_recent: usize,
    /// Upper bound on the digest body.
    pub summary_max_chars: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for CompressionConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            budget: config.context_char_budget,
            keep_recent: config.keep_recent_turns,
            summary_max_chars: config.summary_max_chars,
        }
    }
}

/// Produces the digest of older messages.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, messages: &[Message]) -> Result<String, SessionError>;
}

/// Summarizer backed by the generation backend, called without tools.
pub struct LLMSummarizer {
    backend: Arc<BackendFallback>,
    max_tokens: u32,
}

impl LLMSummarizer {
    pub fn new(backend: Arc<BackendFallback>) -> Self {
        Self {
            backend,
            max_tokens: 512,
        }
    }

    fn build_summarization_prompt(messages: &[Message]) -> String {
        let mut conversation = String::new();

        for msg in messages {
            let role = match msg.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
                MessageRole::System => "System",
                MessageRole::Tool => "Tool",
            };
            if !msg.content.is_empty() {
                conversation.push_str(&format!("{}: {}\n", role, msg.content));
            }
            for call in &msg.tool_calls {
                conversation.push_str(&format!("{} called {}({})\n", role, call.name, call.arguments));
            }
        }

        conversation
    }
}

#[async_trait]
impl Summarizer for LLMSummarizer {
    async fn summarize(&self, messages: &[Message]) -> Result<String, SessionError> {
        if messages.is_empty() {
            return Ok(String::new());
        }

        debug!("Summarizing {} messages", messages.len());
        let conversation = Self::build_summarization_prompt(messages);
        let request = CompletionRequest::new(
            "",
            vec![Message::user(format!(
                "Summarize this conversation:\n\n{}",
                conversation
            ))],
        )
        .with_system(SUMMARY_SYSTEM_PROMPT)
        .with_max_tokens(self.max_tokens);

        let response = self.backend.complete(&request).await?;
        Ok(response.message.content)
    }
}

/// Result of a compression pass.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub messages: Vec<Message>,
    /// Number of messages folded into the digest.
    pub summarized: usize,
    /// Whether the oldest-end fallback ran.
    pub hard_truncated: bool,
}

/// Keeps conversation history within the character budget.
pub struct ContextCompressor {
    summarizer: Arc<dyn Summarizer>,
    config: CompressionConfig,
}

impl ContextCompressor {
    pub fn new(summarizer: Arc<dyn Summarizer>, config: CompressionConfig) -> Self {
        Self { summarizer, config }
    }

    /// Compress `messages` if they exceed the budget. Never fails.
    pub async fn compress(&self, messages: Vec<Message>) -> Compressed {
        let before = total_chars(&messages);
        if before <= self.config.budget {
            return Compressed {
                messages,
                summarized: 0,
                hard_truncated: false,
            };
        }

        let Some(split) = self.plan_split(&messages) else {
            warn!(
                "No summary split fits {} chars, truncating from the oldest end",
                self.config.budget
            );
            return self.hard_truncate(messages);
        };

        let (head, tail) = messages.split_at(split);
        let digest = match self.summarizer.summarize(head).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Summary was empty, truncating from the oldest end");
                return self.hard_truncate(messages);
            }
            Err(e) => {
                warn!("Summary call failed ({}), truncating from the oldest end", e);
                return self.hard_truncate(messages);
            }
        };

        let mut result = vec![summary_message(&digest, self.config.summary_max_chars)];
        result.extend(tail.iter().cloned());

        if total_chars(&result) > self.config.budget {
            return self.hard_truncate(result);
        }

        info!(
            "Compressed context from {} to {} chars ({} messages summarized)",
            before,
            total_chars(&result),
            head.len()
        );
        Compressed {
            messages: result,
            summarized: head.len(),
            hard_truncated: false,
        }
    }

    /// Find the split point that keeps the most recent messages while fitting
    /// the budget once the bounded digest replaces the head.
    fn plan_split(&self, messages: &[Message]) -> Option<usize> {
        let reserved = SUMMARY_LABEL.chars().count() + 1 + self.config.summary_max_chars;
        let max_keep = self.config.keep_recent.min(messages.len());

        for keep in (1..=max_keep).rev() {
            let split = pair_safe_split(messages, messages.len() - keep);
            if split == 0 || split >= messages.len() {
                continue;
            }
            let tail_chars = total_chars(&messages[split..]);
            if reserved + tail_chars <= self.config.budget {
                debug!("Compression keeps {} recent messages", messages.len() - split);
                return Some(split);
            }
        }
        None
    }

    /// Drop from the oldest end until the budget holds.
    fn hard_truncate(&self, mut messages: Vec<Message>) -> Compressed {
        let mut dropped = 0;
        // The latest user prompt survives every drop.
        let mut pinned = messages.iter().rposition(|m| m.role == MessageRole::User);
        while messages.len() > 1 && total_chars(&messages) > self.config.budget {
            let victim = if pinned == Some(0) { 1 } else { 0 };
            messages.remove(victim);
            dropped += 1;
            while victim < messages.len()
                && messages.len() > 1
                && messages[victim].role == MessageRole::Tool
            {
                messages.remove(victim);
                dropped += 1;
            }
            pinned = messages.iter().rposition(|m| m.role == MessageRole::User);
        }
        if total_chars(&messages) > self.config.budget {
            if let Some(last) = messages.last_mut() {
                let overflow = total_chars(std::slice::from_ref(last)).saturating_sub(self.config.budget);
                let allowed = last.content.chars().count().saturating_sub(overflow);
                last.content = cut_to(&last.content, allowed);
            }
        }
        info!("Hard-truncated context, dropped {} oldest messages", dropped);
        Compressed {
            messages,
            summarized: 0,
            hard_truncated: true,
        }
    }
}

/// Move a split forward so the kept tail never opens with tool responses
/// whose calls were folded away.
fn pair_safe_split(messages: &[Message], mut split: usize) -> usize {
    while split < messages.len() && messages[split].role == MessageRole::Tool {
        split += 1;
    }
    split
}

/// Cuts to `allowed` chars, with a marker when one fits.
fn cut_to(content: &str, allowed: usize) -> String {
    if allowed >= MIN_TRUNCATION_STRING_CHARS {
        truncate_str(content, allowed)
    } else {
        content.chars().take(allowed).collect()
    }
}

fn summary_message(digest: &str, max_chars: usize) -> Message {
    Message::system(format!(
        "{}\n{}",
        SUMMARY_LABEL,
        truncate_str(digest.trim(), max_chars)
    ))
}

/// Estimated character volume of carried content.
pub fn total_chars(messages: &[Message]) -> usize {
    messages.iter().map(Message::char_len).sum()
}

#[cfg(test)]
#[path = "compression_tests.rs"]
mod tests;
