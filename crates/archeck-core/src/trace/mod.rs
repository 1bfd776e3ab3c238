//! Guardrail trace parsing and validation.
//!
//! A Converse response carries its verification trace as a nested JSON
//! document. This module validates that document against an embedded schema
//! and turns it into typed records.

mod model;
mod schema;

pub use model::{
    format_seconds, Assessment, AssessmentGroups, AutomatedReasoningPolicy, ConfidenceOnly,
    Finding, GuardrailCoverage, GuardrailTrace, InvalidFinding, InvocationMetrics, PolicyUsage,
    SatisfiableFinding, SatisfiableTranslation, Scenario, Statement, TextCharacters,
    UntranslatedText, ValidFinding, ValidTranslation, FINDING_KINDS,
};
pub use schema::validate_trace_schema;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors raised while reading a trace.
#[derive(Error, Debug)]
pub enum TraceError {
    /// Required trace fields are missing or have an unexpected shape.
    #[error("Malformed trace: {}", .problems.join("; "))]
    Malformed { problems: Vec<String> },

    #[error("Failed to read response file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load trace schema: {0}")]
    Schema(String),
}

impl TraceError {
    pub(crate) fn malformed(problem: impl Into<String>) -> Self {
        TraceError::Malformed {
            problems: vec![problem.into()],
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, TraceError::Malformed { .. })
    }
}

impl GuardrailTrace {
    /// Build a typed trace from the raw `trace` document of a response.
    ///
    /// The document is checked against the schema first; any field the
    /// typed records still reject is reported as malformed too.
    pub fn from_value(trace: &JsonValue) -> Result<Self, TraceError> {
        validate_trace_schema(trace)?;

        let guardrail = trace
            .get("guardrail")
            .ok_or_else(|| TraceError::malformed("missing `guardrail` section"))?;

        GuardrailTrace::deserialize(guardrail)
            .map_err(|e| TraceError::malformed(format!("guardrail: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_without_assessments() {
        let trace = GuardrailTrace::from_value(&json!({ "guardrail": {} })).unwrap();
        assert_eq!(trace.assessment_count(), 0);
    }

    #[test]
    fn test_from_value_rejects_missing_usage() {
        let raw = json!({
            "guardrail": {
                "outputAssessments": {
                    "g1": [{
                        "invocationMetrics": {
                            "guardrailProcessingLatency": 100,
                            "guardrailCoverage": { "textCharacters": { "guarded": 1 } }
                        }
                    }]
                }
            }
        });

        let err = GuardrailTrace::from_value(&raw).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("usage"));
    }

    #[test]
    fn test_from_value_rejects_double_kind_finding() {
        let raw = json!({
            "guardrail": {
                "outputAssessments": {
                    "g1": [{
                        "invocationMetrics": {
                            "guardrailProcessingLatency": 100,
                            "usage": { "automatedReasoningPolicyUnits": 1, "automatedReasoningPolicies": 1 },
                            "guardrailCoverage": { "textCharacters": { "guarded": 1 } }
                        },
                        "automatedReasoningPolicy": {
                            "findings": [{ "noTranslations": {}, "invalid": { "translation": { "confidence": 0.1 } } }]
                        }
                    }]
                }
            }
        });

        let err = GuardrailTrace::from_value(&raw).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("more than one kind"));
    }
}
