//! Report rendering for guarded model responses.
//!
//! The report has three parts, always in this order:
//! 1. The model output (when the response carried any text)
//! 2. The verification analysis: metrics and findings per assessment
//! 3. A raw JSON dump of the full trace
//!
//! Output order follows the source document exactly: group key order, then
//! assessment order, then finding order. Nothing is re-sorted.

mod findings;

pub use findings::{truncate_claim, SCENARIO_PREVIEW, UNTRANSLATED_CLAIM_WIDTH};

use serde_json::Value as JsonValue;

use crate::response::Response;
use crate::trace::{Assessment, GuardrailTrace, TraceError};

/// Width of the section rules.
pub const RULE_WIDTH: usize = 80;

/// Line-oriented text buffer for the report.
pub(crate) struct ReportWriter {
    buf: String,
}

impl ReportWriter {
    pub(crate) fn new() -> Self {
        Self { buf: String::new() }
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn heading(&mut self, title: &str) {
        let rule = "=".repeat(RULE_WIDTH);
        self.line(&rule);
        self.line(format!("=== {} ===", title));
        self.line(&rule);
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

/// A rendered report.
///
/// `text` holds everything that could be rendered. When the trace analysis
/// failed, `error` carries the reason; the raw dump is still part of `text`
/// so the offending document can be inspected.
#[derive(Debug)]
pub struct Report {
    pub text: String,
    pub error: Option<TraceError>,
}

impl Report {
    /// Return the text, or the analysis error if there was one.
    pub fn into_result(self) -> Result<String, TraceError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.text),
        }
    }
}

/// Renders responses into human-readable reports.
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the full report for a response.
    ///
    /// A response without a trace renders only its output section.
    pub fn report(&self, response: &Response) -> Report {
        let mut text = self.render_output(response);
        let mut error = None;

        if let (Some(raw), Some(parsed)) = (&response.trace, response.guardrail_trace()) {
            match parsed {
                Ok(trace) => text.push_str(&self.render_trace(&trace)),
                Err(e) => {
                    tracing::warn!(error = %e, "Trace analysis failed");
                    error = Some(e);
                }
            }

            match self.raw_dump(raw) {
                Ok(dump) => text.push_str(&dump),
                Err(e) => {
                    error.get_or_insert(e);
                }
            }
        }

        Report { text, error }
    }

    /// Render the full report, failing on a malformed trace.
    pub fn render(&self, response: &Response) -> Result<String, TraceError> {
        self.report(response).into_result()
    }

    /// Render the model output section.
    pub fn render_output(&self, response: &Response) -> String {
        let mut out = ReportWriter::new();

        if let Some(text) = &response.output {
            out.blank();
            out.line("=== MODEL OUTPUT ===");
            out.line(text);
            out.blank();
        }

        out.finish()
    }

    /// Render the verification analysis of a parsed trace.
    pub fn render_trace(&self, trace: &GuardrailTrace) -> String {
        let mut out = ReportWriter::new();
        out.heading("AUTOMATED REASONING VERIFICATION");

        for (group, assessments) in trace.output_assessments.iter() {
            for (index, assessment) in assessments.iter().enumerate() {
                tracing::debug!(group, index, "Rendering assessment");
                self.write_assessment(&mut out, group, index + 1, assessment);
            }
        }

        out.finish()
    }

    fn write_assessment(
        &self,
        out: &mut ReportWriter,
        group: &str,
        number: usize,
        assessment: &Assessment,
    ) {
        let metrics = &assessment.invocation_metrics;
        let characters = &metrics.guardrail_coverage.text_characters;

        out.blank();
        out.line(format!("PERFORMANCE METRICS ({} #{}):", group, number));
        out.line(format!(
            "   Total latency: {}ms ({}s)",
            metrics.guardrail_processing_latency,
            metrics.latency_seconds()
        ));
        out.line(format!(
            "   Automated Reasoning units: {}",
            metrics.usage.automated_reasoning_policy_units
        ));
        out.line(format!(
            "   Policies evaluated: {}",
            metrics.usage.automated_reasoning_policies
        ));
        match characters.total {
            Some(total) => out.line(format!(
                "   Characters verified: {} of {}",
                characters.guarded, total
            )),
            None => out.line(format!("   Characters verified: {}", characters.guarded)),
        }

        let Some(policy) = &assessment.automated_reasoning_policy else {
            return;
        };

        out.blank();
        out.line(format!("FINDINGS DETECTED: {}", policy.findings.len()));
        out.line("=".repeat(RULE_WIDTH));

        for (index, finding) in policy.findings.iter().enumerate() {
            findings::write_finding(out, index + 1, finding);
        }
    }

    /// Render the raw trace as pretty-printed JSON under its own heading.
    pub fn raw_dump(&self, trace: &JsonValue) -> Result<String, TraceError> {
        let mut out = ReportWriter::new();
        out.blank();
        out.heading("FULL TRACE (JSON)");
        out.line(serde_json::to_string_pretty(trace)?);
        Ok(out.finish())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn assessment(latency: u64, findings: Option<JsonValue>) -> JsonValue {
        let mut value = json!({
            "invocationMetrics": {
                "guardrailProcessingLatency": latency,
                "usage": { "automatedReasoningPolicyUnits": 2, "automatedReasoningPolicies": 1 },
                "guardrailCoverage": { "textCharacters": { "guarded": 512 } }
            }
        });
        if let Some(findings) = findings {
            value["automatedReasoningPolicy"] = json!({ "findings": findings });
        }
        value
    }

    fn response_with(assessments: Vec<JsonValue>) -> Response {
        Response {
            output: Some("You get 15 days.".to_string()),
            stop_reason: Some("end_turn".to_string()),
            usage: None,
            latency_ms: None,
            trace: Some(json!({
                "guardrail": { "outputAssessments": { "assessment-0": assessments } }
            })),
        }
    }

    #[test]
    fn test_no_trace_renders_only_output() {
        let response = Response {
            output: Some("hello".to_string()),
            stop_reason: None,
            usage: None,
            latency_ms: None,
            trace: None,
        };

        let text = Renderer::new().render(&response).unwrap();
        assert!(text.contains("=== MODEL OUTPUT ==="));
        assert!(!text.contains("VERIFICATION"));
        assert!(!text.contains("FULL TRACE"));
    }

    #[test]
    fn test_no_trace_no_output_is_empty() {
        let response = Response {
            output: None,
            stop_reason: None,
            usage: None,
            latency_ms: None,
            trace: None,
        };
        assert_eq!(Renderer::new().render(&response).unwrap(), "");
    }

    #[test]
    fn test_latency_rendered_in_seconds() {
        let text = Renderer::new()
            .render(&response_with(vec![assessment(4230, None)]))
            .unwrap();
        assert!(text.contains("Total latency: 4230ms (4.2s)"));
        assert!(text.contains("Automated Reasoning units: 2"));
        assert!(text.contains("Policies evaluated: 1"));
        assert!(text.contains("Characters verified: 512\n"));
    }

    #[test]
    fn test_no_policy_section_skips_findings() {
        let text = Renderer::new()
            .render(&response_with(vec![assessment(100, None)]))
            .unwrap();
        assert!(!text.contains("FINDINGS DETECTED"));
    }

    #[test]
    fn test_empty_findings_header_only() {
        let text = Renderer::new()
            .render(&response_with(vec![assessment(100, Some(json!([])))]))
            .unwrap();
        assert!(text.contains("FINDINGS DETECTED: 0"));
        assert!(!text.contains("FINDING #"));
    }

    #[test]
    fn test_findings_numbered_in_order() {
        let findings = json!([
            { "noTranslations": {} },
            { "invalid": { "translation": { "confidence": 0.4 } } },
            { "tooComplex": {} }
        ]);
        let text = Renderer::new()
            .render(&response_with(vec![assessment(100, Some(findings))]))
            .unwrap();

        let first = text.find("FINDING #1").unwrap();
        let no_translations = text.find("[NO_TRANSLATIONS]").unwrap();
        let second = text.find("FINDING #2").unwrap();
        let invalid = text.find("[INVALID]").unwrap();
        let third = text.find("FINDING #3").unwrap();
        let unrecognized = text.find("[UNRECOGNIZED]").unwrap();
        assert!(first < no_translations && no_translations < second);
        assert!(second < invalid && invalid < third && third < unrecognized);
    }

    #[test]
    fn test_malformed_trace_keeps_raw_dump() {
        let mut broken = assessment(100, None);
        broken["invocationMetrics"]
            .as_object_mut()
            .unwrap()
            .remove("usage");

        let report = Renderer::new().report(&response_with(vec![broken]));
        assert!(report.error.as_ref().unwrap().is_malformed());
        assert!(report.text.contains("FULL TRACE (JSON)"));
        assert!(!report.text.contains("PERFORMANCE METRICS"));
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_raw_dump_preserves_key_order() {
        let raw = json!({ "guardrail": { "zeta": 1, "alpha": 2 } });
        let dump = Renderer::new().raw_dump(&raw).unwrap();
        assert!(dump.find("\"zeta\"").unwrap() < dump.find("\"alpha\"").unwrap());
    }

    proptest! {
        #[test]
        fn prop_latency_line_matches_seconds(latency in 0u64..10_000_000) {
            let text = Renderer::new()
                .render(&response_with(vec![assessment(latency, None)]))
                .unwrap();
            let expected = format!(
                "Total latency: {}ms ({:.1}s)",
                latency,
                latency as f64 / 1000.0
            );
            prop_assert!(text.contains(&expected));
        }
    }
}
