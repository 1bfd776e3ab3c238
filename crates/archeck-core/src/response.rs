//! Converse response document.
//!
//! Only the parts the report needs are typed; the trace is kept as raw JSON
//! so it can be dumped without loss and validated separately.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::trace::{GuardrailTrace, TraceError};

/// Stop reason the service reports when a guardrail replaced the output.
pub const GUARDRAIL_INTERVENED: &str = "guardrail_intervened";

/// A response returned by one guarded model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Generated text, absent when nothing was produced
    pub output: Option<String>,

    /// Why generation stopped (e.g. "end_turn", "guardrail_intervened")
    pub stop_reason: Option<String>,

    /// Token usage reported by the service
    pub usage: Option<TokenUsage>,

    /// Service-side latency in milliseconds
    pub latency_ms: Option<u64>,

    /// Verification trace, exactly as received
    pub trace: Option<JsonValue>,
}

/// Token counters from the `usage` block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseWire {
    #[serde(default)]
    output: Option<OutputWire>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<TokenUsage>,
    #[serde(default)]
    metrics: Option<MetricsWire>,
    #[serde(default)]
    trace: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct OutputWire {
    #[serde(default)]
    message: Option<MessageWire>,
}

#[derive(Debug, Deserialize)]
struct MessageWire {
    #[serde(default)]
    content: Vec<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsWire {
    #[serde(default)]
    latency_ms: Option<u64>,
}

impl Response {
    /// Build a response from a Converse response document.
    pub fn from_value(value: JsonValue) -> Result<Self, TraceError> {
        let wire: ConverseWire = serde_json::from_value(value)?;

        // Only text blocks are rendered; other content kinds are skipped.
        let output = wire
            .output
            .and_then(|o| o.message)
            .map(|m| {
                m.content
                    .iter()
                    .filter_map(|block| block.get("text").and_then(JsonValue::as_str))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty());

        Ok(Self {
            output,
            stop_reason: wire.stop_reason,
            usage: wire.usage,
            latency_ms: wire.metrics.and_then(|m| m.latency_ms),
            trace: wire.trace.filter(|t| !t.is_null()),
        })
    }

    /// Parse a response from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parse a response from a saved JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Whether the guardrail replaced the model output.
    pub fn guardrail_intervened(&self) -> bool {
        self.stop_reason.as_deref() == Some(GUARDRAIL_INTERVENED)
    }

    /// Typed view of the trace, if one was returned.
    pub fn guardrail_trace(&self) -> Option<Result<GuardrailTrace, TraceError>> {
        self.trace.as_ref().map(GuardrailTrace::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_document() {
        let response = Response::from_value(json!({
            "output": { "message": { "role": "assistant", "content": [{ "text": "15 days." }] } },
            "stopReason": "end_turn",
            "usage": { "inputTokens": 120, "outputTokens": 30, "totalTokens": 150 },
            "metrics": { "latencyMs": 2100 },
            "trace": { "guardrail": {} }
        }))
        .unwrap();

        assert_eq!(response.output.as_deref(), Some("15 days."));
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(response.usage.as_ref().unwrap().total_tokens, 150);
        assert_eq!(response.latency_ms, Some(2100));
        assert!(response.trace.is_some());
        assert!(!response.guardrail_intervened());
    }

    #[test]
    fn test_blocked_response_has_no_output() {
        let response = Response::from_json(r#"{"stopReason": "guardrail_intervened"}"#).unwrap();
        assert!(response.output.is_none());
        assert!(response.trace.is_none());
        assert!(response.guardrail_intervened());
    }

    #[test]
    fn test_non_text_blocks_skipped() {
        let response = Response::from_value(json!({
            "output": { "message": { "content": [
                { "reasoningContent": { "reasoningText": { "text": "hidden" } } },
                { "text": "visible" }
            ] } }
        }))
        .unwrap();
        assert_eq!(response.output.as_deref(), Some("visible"));
    }

    #[test]
    fn test_not_an_object_is_json_error() {
        let result = Response::from_json("[1, 2, 3]");
        assert!(matches!(result, Err(TraceError::Json(_))));
    }
}
