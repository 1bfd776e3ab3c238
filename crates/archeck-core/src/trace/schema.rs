//! JSON Schema validation for guardrail traces.
//!
//! The schema pins down the fields the report relies on, so a trace that is
//! missing a required metric is rejected with every offending location
//! listed instead of only the first one serde trips over.

use std::sync::OnceLock;

use serde_json::Value as JsonValue;

use super::TraceError;

/// Embedded trace schema (loaded at compile time).
const TRACE_SCHEMA_JSON: &str = include_str!("../../schema/guardrail-trace.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, TraceError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: JsonValue = match serde_json::from_str(TRACE_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(TraceError::Schema(e.clone())),
    }
}

/// Validate a raw trace document against the schema.
///
/// Returns every violation as `"<message> at <json pointer>"`.
pub fn validate_trace_schema(trace: &JsonValue) -> Result<(), TraceError> {
    let validator = get_validator()?;

    let problems: Vec<String> = validator
        .iter_errors(trace)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(TraceError::Malformed { problems })
    }
}
