//! Per-kind finding blocks.

use crate::trace::{
    Finding, InvalidFinding, SatisfiableFinding, Statement, UntranslatedText, ValidFinding,
};

use super::{ReportWriter, RULE_WIDTH};

/// Number of true-scenario statements shown before the remainder is summarized.
pub const SCENARIO_PREVIEW: usize = 3;

/// Maximum characters shown per untranslated claim.
pub const UNTRANSLATED_CLAIM_WIDTH: usize = 80;

const ITEM_INDENT: &str = "      ";

/// Truncate `text` to `width` characters, appending `...` when cut.
pub fn truncate_claim(text: &str, width: usize) -> String {
    match text.char_indices().nth(width) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Write the block for the finding numbered `number` (1-based).
pub(crate) fn write_finding(out: &mut ReportWriter, number: usize, finding: &Finding) {
    let divider = "─".repeat(RULE_WIDTH);
    out.blank();
    out.line(&divider);
    out.line(format!("FINDING #{}", number));
    out.line(&divider);

    match finding {
        Finding::Satisfiable(sat) => write_satisfiable(out, sat),
        Finding::Valid(valid) => write_valid(out, valid),
        Finding::Invalid(invalid) => write_invalid(out, invalid),
        Finding::NoTranslations => write_no_translations(out),
        Finding::Unrecognized { kinds } => {
            tracing::warn!(kinds = ?kinds, "Unrecognized finding kind");
            write_unrecognized(out, kinds);
        }
    }
}

fn write_confidence(out: &mut ReportWriter, confidence: f64) {
    out.line(format!("   Confidence: {:.2}", confidence));
}

fn write_statements(out: &mut ReportWriter, heading: &str, statements: &[Statement]) {
    if statements.is_empty() {
        return;
    }
    out.blank();
    out.line(format!("   {}:", heading));
    for statement in statements {
        out.line(format!("{}• {}", ITEM_INDENT, statement.natural_language));
    }
}

fn write_satisfiable(out: &mut ReportWriter, sat: &SatisfiableFinding) {
    out.line("[SATISFIABLE] Logically consistent with the policy");
    write_confidence(out, sat.translation.confidence);

    write_statements(out, "Extracted premises", &sat.translation.premises);
    write_statements(out, "Claims", &sat.translation.claims);

    let statements = &sat.claims_true_scenario.statements;
    out.blank();
    out.line("   Scenario where the claims are TRUE:");
    for statement in statements.iter().take(SCENARIO_PREVIEW) {
        out.line(format!("{}• {}", ITEM_INDENT, statement.natural_language));
    }
    let remaining = statements.len().saturating_sub(SCENARIO_PREVIEW);
    if remaining > 0 {
        out.line(format!("{}... and {} more", ITEM_INDENT, remaining));
    }
}

fn write_valid(out: &mut ReportWriter, valid: &ValidFinding) {
    out.line("[VALID] Verified against the policy");
    write_confidence(out, valid.translation.confidence);

    write_statements(out, "Verified claims", &valid.translation.claims);

    if let Some(untranslated) = valid.translation.untranslated_claims.as_deref() {
        write_untranslated(out, untranslated);
    }
}

fn write_untranslated(out: &mut ReportWriter, claims: &[UntranslatedText]) {
    let rule = format!("   {}", "=".repeat(RULE_WIDTH - 10));

    out.blank();
    out.line("   WARNING: UNTRANSLATED CLAIMS");
    out.line(&rule);
    out.line("   The following content was NOT formally verified:");
    out.line(&rule);
    for claim in claims {
        out.blank();
        out.line(format!(
            "{}\"{}\"",
            ITEM_INDENT,
            truncate_claim(&claim.text, UNTRANSLATED_CLAIM_WIDTH)
        ));
    }
    out.blank();
    out.line("   IMPLICATION:");
    out.line("   These statements may be unsupported additions by the model. They were");
    out.line("   generated but could not be checked against the formal policy rules.");
}

fn write_invalid(out: &mut ReportWriter, invalid: &InvalidFinding) {
    out.line("[INVALID] CONTRADICTION DETECTED");
    write_confidence(out, invalid.translation.confidence);
    out.blank();
    out.line("   The content contradicts the configured policy");
}

fn write_no_translations(out: &mut ReportWriter) {
    out.line("[NO_TRANSLATIONS] No formal logic extracted");
    out.line("   This content could not be translated into formal logic");
    out.line("   (expected for narrative, contextual, or ambiguous text)");
}

fn write_unrecognized(out: &mut ReportWriter, kinds: &[String]) {
    let named = if kinds.is_empty() {
        "<empty>".to_string()
    } else {
        kinds.join(", ")
    };
    out.line(format!("[UNRECOGNIZED] Unrecognized finding type: {}", named));
}
