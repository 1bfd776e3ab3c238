//! Typed view of a guardrail trace.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Finding keys the renderer knows how to display.
pub const FINDING_KINDS: &[&str] = &["satisfiable", "valid", "invalid", "noTranslations"];

/// The `guardrail` section of a Converse trace.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailTrace {
    /// Output assessments keyed by group, in document order
    #[serde(default)]
    pub output_assessments: AssessmentGroups,
}

impl GuardrailTrace {
    /// Total number of assessments across every group.
    pub fn assessment_count(&self) -> usize {
        self.output_assessments
            .iter()
            .map(|(_, assessments)| assessments.len())
            .sum()
    }
}

/// Assessment groups keyed by name.
///
/// Keeps the order in which the keys appear in the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentGroups(Vec<(String, Vec<Assessment>)>);

impl AssessmentGroups {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Assessment])> {
        self.0
            .iter()
            .map(|(key, assessments)| (key.as_str(), assessments.as_slice()))
    }
}

impl<'de> Deserialize<'de> for AssessmentGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = AssessmentGroups;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of assessment groups")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, assessments)) = map.next_entry::<String, Vec<Assessment>>()? {
                    groups.push((key, assessments));
                }
                Ok(AssessmentGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// One guardrail assessment of the model output.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub invocation_metrics: InvocationMetrics,

    /// Absent when no automated-reasoning policy ran on this assessment
    #[serde(default)]
    pub automated_reasoning_policy: Option<AutomatedReasoningPolicy>,
}

/// Performance counters reported for every assessment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationMetrics {
    /// Processing latency in milliseconds
    pub guardrail_processing_latency: u64,
    pub usage: PolicyUsage,
    pub guardrail_coverage: GuardrailCoverage,
}

impl InvocationMetrics {
    /// Latency in seconds, rounded to one decimal place.
    pub fn latency_seconds(&self) -> String {
        format_seconds(self.guardrail_processing_latency)
    }
}

/// Format a millisecond count as seconds with one decimal.
pub fn format_seconds(latency_ms: u64) -> String {
    format!("{:.1}", latency_ms as f64 / 1000.0)
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUsage {
    pub automated_reasoning_policy_units: u64,
    pub automated_reasoning_policies: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailCoverage {
    pub text_characters: TextCharacters,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TextCharacters {
    pub guarded: u64,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AutomatedReasoningPolicy {
    pub findings: Vec<Finding>,
}

/// A natural-language statement extracted by the verifier.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub natural_language: String,
}

/// Text the verifier could not turn into formal logic.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UntranslatedText {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SatisfiableTranslation {
    pub confidence: f64,
    #[serde(default)]
    pub premises: Vec<Statement>,
    #[serde(default)]
    pub claims: Vec<Statement>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(default)]
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SatisfiableFinding {
    pub translation: SatisfiableTranslation,
    pub claims_true_scenario: Scenario,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidTranslation {
    pub confidence: f64,
    #[serde(default)]
    pub claims: Vec<Statement>,
    #[serde(default)]
    pub untranslated_claims: Option<Vec<UntranslatedText>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ValidFinding {
    pub translation: ValidTranslation,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConfidenceOnly {
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InvalidFinding {
    pub translation: ConfidenceOnly,
}

/// One automated-reasoning verification result.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Satisfiable(SatisfiableFinding),
    Valid(ValidFinding),
    Invalid(InvalidFinding),
    NoTranslations,
    /// A finding kind this build does not know how to display
    Unrecognized { kinds: Vec<String> },
}

impl Finding {
    /// Short marker naming the finding kind.
    pub fn marker(&self) -> &'static str {
        match self {
            Finding::Satisfiable(_) => "SATISFIABLE",
            Finding::Valid(_) => "VALID",
            Finding::Invalid(_) => "INVALID",
            Finding::NoTranslations => "NO_TRANSLATIONS",
            Finding::Unrecognized { .. } => "UNRECOGNIZED",
        }
    }

    /// Confidence of the translation, when the kind carries one.
    pub fn confidence(&self) -> Option<f64> {
        match self {
            Finding::Satisfiable(f) => Some(f.translation.confidence),
            Finding::Valid(f) => Some(f.translation.confidence),
            Finding::Invalid(f) => Some(f.translation.confidence),
            Finding::NoTranslations | Finding::Unrecognized { .. } => None,
        }
    }
}

impl<'de> Deserialize<'de> for Finding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = JsonMap::<String, JsonValue>::deserialize(deserializer)?;

        let present: Vec<&'static str> = FINDING_KINDS
            .iter()
            .copied()
            .filter(|kind| fields.contains_key(*kind))
            .collect();

        let kind = match present.as_slice() {
            [] => {
                return Ok(Finding::Unrecognized {
                    kinds: fields.keys().cloned().collect(),
                })
            }
            [kind] => *kind,
            many => {
                return Err(de::Error::custom(format!(
                    "finding carries more than one kind: {}",
                    many.join(", ")
                )))
            }
        };

        let payload = fields.remove(kind).unwrap_or(JsonValue::Null);
        let finding = match kind {
            "satisfiable" => serde_json::from_value(payload).map(Finding::Satisfiable),
            "valid" => serde_json::from_value(payload).map(Finding::Valid),
            "invalid" => serde_json::from_value(payload).map(Finding::Invalid),
            _ => Ok(Finding::NoTranslations),
        };

        finding.map_err(|e| de::Error::custom(format!("{}: {}", kind, e)))
    }
}
