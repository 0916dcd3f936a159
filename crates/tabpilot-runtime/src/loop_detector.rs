//! Repeated tool-call plan detection.
//!
//! A recognized browsing workflow (search, list results, click, extract)
//! legitimately repeats similar calls, so it gets a higher threshold than
//! arbitrary repeats.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use tabpilot_config::LoopDetectionConfig;
use tabpilot_protocols::types::ToolCall;

/// Tunable repeat thresholds.
#[derive(Debug, Clone)]
pub struct LoopPolicy {
    pub workflow_threshold: u32,
    pub default_threshold: u32,
    pub workflow_tools: HashSet<String>,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self::from(&LoopDetectionConfig::default())
    }
}

impl From<&LoopDetectionConfig> for LoopPolicy {
    fn from(config: &LoopDetectionConfig) -> Self {
        Self {
            workflow_threshold: config.workflow_threshold.max(1),
            default_threshold: config.default_threshold.max(1),
            workflow_tools: config.workflow_tools.iter().cloned().collect(),
        }
    }
}

/// What the detector concluded about a round's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopVerdict {
    /// Keep going. `repeats` is the current repeat count.
    Continue { repeats: u32 },
    /// Threshold reached; stop calling tools.
    Stalled { repeats: u32, threshold: u32 },
}

impl LoopPolicy {
    /// Whether every call in the batch belongs to the browsing workflow.
    pub fn is_workflow(&self, calls: &[ToolCall]) -> bool {
        !calls.is_empty() && calls.iter().all(|c| self.workflow_tools.contains(&c.name))
    }

    pub fn threshold_for(&self, calls: &[ToolCall]) -> u32 {
        if self.is_workflow(calls) {
            self.workflow_threshold
        } else {
            self.default_threshold
        }
    }

    pub fn verdict(&self, calls: &[ToolCall], repeats: u32) -> LoopVerdict {
        let threshold = self.threshold_for(calls);
        if repeats >= threshold {
            LoopVerdict::Stalled { repeats, threshold }
        } else {
            LoopVerdict::Continue { repeats }
        }
    }
}

/// Order-independent signature of a call batch: names plus canonical arguments.
pub fn call_signature(calls: &[ToolCall]) -> String {
    let mut parts: Vec<String> = calls
        .iter()
        .map(|c| format!("{}:{}", c.name, canonical(&c.arguments)))
        .collect();
    parts.sort();
    parts.join("|")
}

fn canonical(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, String> =
                map.iter().map(|(k, v)| (k, canonical(v))).collect();
            let body: Vec<String> = sorted
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), v))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::new("id", name, args)
    }

    #[test]
    fn test_signature_ignores_order_and_ids() {
        let a = vec![
            ToolCall::new("1", "clickSelector", json!({"selector": "#a"})),
            ToolCall::new("2", "extractText", json!({"method": "clean", "query": "x"})),
        ];
        let b = vec![
            ToolCall::new("9", "extractText", json!({"query": "x", "method": "clean"})),
            ToolCall::new("8", "clickSelector", json!({"selector": "#a"})),
        ];
        assert_eq!(call_signature(&a), call_signature(&b));
    }

    #[test]
    fn test_signature_distinguishes_arguments() {
        let a = vec![call("navigate", json!({"url": "https://a.example"}))];
        let b = vec![call("navigate", json!({"url": "https://b.example"}))];
        assert_ne!(call_signature(&a), call_signature(&b));
    }

    #[test]
    fn test_workflow_threshold_applies_to_workflow_batches() {
        let policy = LoopPolicy::default();
        let workflow = vec![call("getSearchResults", json!({}))];
        let other = vec![call("clickSelector", json!({"selector": "#x"}))];
        let mixed = vec![
            call("getSearchResults", json!({})),
            call("clickSelector", json!({"selector": "#x"})),
        ];

        assert_eq!(policy.threshold_for(&workflow), 4);
        assert_eq!(policy.threshold_for(&other), 2);
        assert_eq!(policy.threshold_for(&mixed), 2);
    }

    #[test]
    fn test_verdict_at_threshold() {
        let policy = LoopPolicy::default();
        let other = vec![call("pressKey", json!({"key": "Enter"}))];
        assert_eq!(policy.verdict(&other, 1), LoopVerdict::Continue { repeats: 1 });
        assert_eq!(
            policy.verdict(&other, 2),
            LoopVerdict::Stalled {
                repeats: 2,
                threshold: 2
            }
        );

        let workflow = vec![call("extractText", json!({}))];
        assert_eq!(policy.verdict(&workflow, 3), LoopVerdict::Continue { repeats: 3 });
        assert!(matches!(
            policy.verdict(&workflow, 4),
            LoopVerdict::Stalled { threshold: 4, .. }
        ));
    }

    #[test]
    fn test_policy_from_config() {
        let config = LoopDetectionConfig {
            workflow_threshold: 6,
            default_threshold: 0,
            workflow_tools: vec!["navigate".to_string()],
        };
        let policy = LoopPolicy::from(&config);
        assert_eq!(policy.workflow_threshold, 6);
        assert_eq!(policy.default_threshold, 1);
        assert!(policy.is_workflow(&[call("navigate", json!({}))]));
        assert!(!policy.is_workflow(&[]));
    }
}
