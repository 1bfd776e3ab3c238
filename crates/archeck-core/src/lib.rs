//! # archeck-core
//!
//! Deterministic rendering of guardrail automated-reasoning traces.
//!
//! A guarded Converse call can return a verification trace describing how
//! an automated-reasoning policy judged the model output. This crate turns
//! that trace into a categorized, human-readable report.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same response always produces the same report
//! 2. **No network calls**: Rendering works on an already received document
//! 3. **Order-preserving**: Groups, assessments and findings keep document order
//! 4. **Fail-closed**: Missing required trace fields are reported, never guessed
//!
//! ## Example
//!
//! ```rust,ignore
//! use archeck_core::{Renderer, Response};
//!
//! let response = Response::from_json_file("response.json")?;
//! let report = Renderer::new().render(&response)?;
//! print!("{}", report);
//! ```

pub mod render;
pub mod response;
pub mod trace;

// Re-export main types at crate root
pub use render::{Renderer, Report};
pub use response::{Response, TokenUsage, GUARDRAIL_INTERVENED};
pub use trace::{Assessment, Finding, GuardrailTrace, InvocationMetrics, TraceError};

/// Render the report for a response.
///
/// This is the main entry point for rendering.
///
/// # Returns
///
/// The report text, or `TraceError::Malformed` when the trace is missing
/// required fields.
pub fn render(response: &Response) -> Result<String, TraceError> {
    Renderer::new().render(response)
}
